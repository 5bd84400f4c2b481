//! Static character-width table for Times New Roman 12pt, as rendered by the
//! EPB/OPB/decoration PDF form fields.
//!
//! Widths are stored in font units (1/1000 em) and summed as integers, so the width of
//! a concatenation is always the exact sum of the widths of its parts. Conversion to
//! pixels happens once, at the end: 12pt at 96 DPI is 16px per em.
//!
//! ASCII 0x20..=0x7E is covered by an indexed array (index = `(c as usize) - 32`).
//! A short list of non-ASCII code points (the optimization spaces, the non-breaking
//! hyphen, typographic quotes and dashes) is matched explicitly. Everything else falls
//! back to `DEFAULT_UNITS` (8px) so arbitrary Unicode input never fails.

// ────────────────────────────────────────────────────────────────────────────
// Form geometry
// ────────────────────────────────────────────────────────────────────────────

/// Font size of the reference form field.
pub const FONT_SIZE_PT: f64 = 12.0;
/// Screen resolution the form widths are calibrated at.
pub const PX_PER_INCH: f64 = 96.0;
const PT_PER_INCH: f64 = 72.0;
const MM_PER_INCH: f64 = 25.4;

/// Physical width of the narrative field on the evaluation form.
pub const FORM_FIELD_WIDTH_MM: f64 = 202.6576;

/// Width of the narrative field in pixels: 202.6576mm at 96 DPI ≈ 765.95px.
pub const DEFAULT_TARGET_WIDTH: f64 = FORM_FIELD_WIDTH_MM * PX_PER_INCH / MM_PER_INCH;

/// Pixels per font unit: (12pt × 96/72 px/pt) / 1000 units per em = 0.016.
pub const PX_PER_UNIT: f64 = FONT_SIZE_PT * (PX_PER_INCH / PT_PER_INCH) / 1000.0;

// ────────────────────────────────────────────────────────────────────────────
// Special characters
// ────────────────────────────────────────────────────────────────────────────

/// U+2009 THIN SPACE: narrower than a regular space; used to shrink a line.
pub const THIN_SPACE: char = '\u{2009}';
/// U+2004 THREE-PER-EM SPACE: wider than a regular space; used to grow a line.
pub const MEDIUM_SPACE: char = '\u{2004}';
/// U+200A HAIR SPACE.
pub const HAIR_SPACE: char = '\u{200A}';
/// U+2011 NON-BREAKING HYPHEN: same advance as `-`.
pub const NON_BREAKING_HYPHEN: char = '\u{2011}';

/// Units used for any code point the table does not know (8px at 16px/em).
pub const DEFAULT_UNITS: u32 = 500;

const SPACE_UNITS: u32 = 250;
const THIN_SPACE_UNITS: u32 = 200;
const MEDIUM_SPACE_UNITS: u32 = 333;
const HAIR_SPACE_UNITS: u32 = 100;
const HYPHEN_UNITS: u32 = 333;

/// Per-character advance widths for the reference font.
///
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
pub struct CharacterWidthTable {
    ascii: [u32; 95],
    default_units: u32,
}

impl CharacterWidthTable {
    /// Width of a single character in font units.
    pub fn units_of(&self, c: char) -> u32 {
        let code = c as usize;
        if (32..=126).contains(&code) {
            return self.ascii[code - 32];
        }
        match c {
            THIN_SPACE => THIN_SPACE_UNITS,
            MEDIUM_SPACE => MEDIUM_SPACE_UNITS,
            HAIR_SPACE => HAIR_SPACE_UNITS,
            NON_BREAKING_HYPHEN | '\u{2010}' => HYPHEN_UNITS,
            '\u{00A0}' => SPACE_UNITS,
            '\u{2013}' => 500,
            '\u{2014}' => 1000,
            '\u{2018}' | '\u{2019}' => 333,
            '\u{201C}' | '\u{201D}' => 444,
            '\u{2022}' => 350,
            '\u{2026}' => 1000,
            '\u{00A7}' => 500,
            '\u{00B0}' => 400,
            '\u{00D7}' => 564,
            _ => self.default_units,
        }
    }

    /// Width of a string in font units: the sum over every `char` (not grapheme cluster).
    pub fn units_of_str(&self, s: &str) -> u64 {
        s.chars().map(|c| u64::from(self.units_of(c))).sum()
    }

    /// Width of a single character in pixels.
    pub fn width_of(&self, c: char) -> f64 {
        f64::from(self.units_of(c)) * PX_PER_UNIT
    }

    /// Width of a string in pixels.
    pub fn width_of_str(&self, s: &str) -> f64 {
        units_to_px(self.units_of_str(s))
    }
}

/// Converts a font-unit total to pixels.
pub fn units_to_px(units: u64) -> f64 {
    units as f64 * PX_PER_UNIT
}

// ────────────────────────────────────────────────────────────────────────────
// Static table
// ────────────────────────────────────────────────────────────────────────────

static TIMES_NEW_ROMAN_12: CharacterWidthTable = CharacterWidthTable {
    #[rustfmt::skip]
    ascii: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
        // 0    1    2    3    4    5    6    7    8    9
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
        // :    ;    <    =    >    ?    @
        278, 278, 564, 564, 564, 444, 921,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
        // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
        722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
        // [    \    ]    ^    _    `
        333, 278, 333, 469, 500, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
        // {    |    }    ~
        480, 200, 480, 541,
    ],
    default_units: DEFAULT_UNITS,
};

/// Returns the process-wide width table for the reference form font.
pub fn form_table() -> &'static CharacterWidthTable {
    &TIMES_NEW_ROMAN_12
}

/// Pixel width of a single character in the form font.
pub fn width_of_char(c: char) -> f64 {
    form_table().width_of(c)
}

/// Pixel width of a string in the form font.
pub fn width_of(text: &str) -> f64 {
    form_table().width_of_str(text)
}

/// Pixel width of a regular space.
pub fn space_width() -> f64 {
    width_of_char(' ')
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
