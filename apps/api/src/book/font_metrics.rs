//! Static font-metric tables for the two standard-14 faces the book uses.
//!
//! Widths are the Adobe AFM advance widths in thousandths of an em. Because the
//! PDF references Helvetica without embedding it, every conforming viewer lays
//! glyphs out with these same widths, so line breaks computed here match what
//! the reader sees.
//!
//! Tables cover ASCII 0x20..=0x7E (95 printable characters). Index = (char as usize) - 32.
//! Latin-1 letters with diacritics fold to their base letter, which in Helvetica
//! has the same advance width.

// ────────────────────────────────────────────────────────────────────────────
// Font faces
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    /// Body text.
    Helvetica,
    /// Cover title.
    HelveticaBold,
}

impl FontFace {
    /// The PDF `/BaseFont` name.
    pub fn base_font(&self) -> &'static str {
        match self {
            FontFace::Helvetica => "Helvetica",
            FontFace::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Resource name used in page content streams.
    pub fn resource_name(&self) -> &'static str {
        match self {
            FontFace::Helvetica => "F1",
            FontFace::HelveticaBold => "F2",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Width slot layout:
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
pub struct FontMetricTable {
    widths: [u16; 95],
    /// Width for characters with no entry and no fold (thousandths of an em).
    fallback_width: u16,
}

impl FontMetricTable {
    /// Advance width of one character in thousandths of an em.
    pub fn char_width(&self, c: char) -> u16 {
        let c = fold_latin1(c);
        let code = c as usize;
        if (32..=126).contains(&code) {
            return self.widths[code - 32];
        }
        match c {
            '—' | '…' => 1000,
            '–' => 556,
            '“' | '”' => 333,
            '‘' | '’' => 222,
            '«' | '»' => 556,
            '¡' => 333,
            '¿' => 611,
            '\u{a0}' => self.widths[0],
            _ => self.fallback_width,
        }
    }

    /// Rendered width of `s` in points at `size_pt`.
    pub fn measure(&self, s: &str, size_pt: f32) -> f32 {
        let units: u32 = s.chars().map(|c| self.char_width(c) as u32).sum();
        units as f32 * size_pt / 1000.0
    }

    /// Width of a single space in points at `size_pt`.
    pub fn space_width(&self, size_pt: f32) -> f32 {
        self.widths[0] as f32 * size_pt / 1000.0
    }
}

/// Maps accented Latin-1 letters to the unaccented letter with the same advance width.
fn fold_latin1(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => 'A',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'O',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'Ñ' => 'N',
        'Ç' => 'C',
        other => other,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0    1    2    3    4    5    6    7    8    9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        278, 278, 584, 584, 584, 556, 1015,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
        // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        278, 278, 278, 469, 556, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
        // {    |    }    ~
        334, 260, 334, 584,
    ],
    fallback_width: 556,
};

static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0    1    2    3    4    5    6    7    8    9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        333, 333, 584, 584, 584, 611, 975,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
        // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        333, 278, 333, 584, 556, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
        // {    |    }    ~
        389, 280, 389, 584,
    ],
    fallback_width: 611,
};

/// Returns the static metric table for a face.
pub fn get_metrics(face: FontFace) -> &'static FontMetricTable {
    match face {
        FontFace::Helvetica => &HELVETICA_TABLE,
        FontFace::HelveticaBold => &HELVETICA_BOLD_TABLE,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_empty_is_zero() {
        assert_eq!(get_metrics(FontFace::Helvetica).measure("", 14.0), 0.0);
    }

    #[test]
    fn test_measure_ascii_word() {
        // "Pepe" = P(667) + e(556) + p(556) + e(556) = 2335 units → 32.69pt at 14pt
        let width = get_metrics(FontFace::Helvetica).measure("Pepe", 14.0);
        assert!((width - 32.69).abs() < 1e-3, "got {width}");
    }

    #[test]
    fn test_accented_letters_match_base_letters() {
        let metrics = get_metrics(FontFace::Helvetica);
        assert_eq!(
            metrics.measure("Pepón mañana", 14.0),
            metrics.measure("Pepon manana", 14.0)
        );
    }

    #[test]
    fn test_spanish_punctuation_has_widths() {
        let metrics = get_metrics(FontFace::Helvetica);
        assert_eq!(metrics.char_width('¡'), 333);
        assert_eq!(metrics.char_width('—'), 1000);
    }

    #[test]
    fn test_bold_is_wider_than_regular() {
        let text = "El barrilete viajero";
        assert!(
            get_metrics(FontFace::HelveticaBold).measure(text, 36.0)
                > get_metrics(FontFace::Helvetica).measure(text, 36.0)
        );
    }

    #[test]
    fn test_space_width_scales_with_size() {
        let metrics = get_metrics(FontFace::Helvetica);
        assert!((metrics.space_width(10.0) - 2.78).abs() < 1e-4);
        assert!((metrics.space_width(20.0) - 5.56).abs() < 1e-4);
    }
}
