//! Content stream operators.

/// A recognized content stream operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    // graphics state
    Save,
    Restore,
    ConcatMatrix,
    LineWidth,
    LineCap,
    LineJoin,
    MiterLimit,
    Dash,
    RenderingIntent,
    Flatness,
    ExtGState,
    // color
    StrokeGray,
    FillGray,
    StrokeRgb,
    FillRgb,
    StrokeCmyk,
    FillCmyk,
    StrokeColorSpace,
    FillColorSpace,
    StrokeColor,
    StrokeColorN,
    FillColor,
    FillColorN,
    // text objects and state
    BeginText,
    EndText,
    CharSpacing,
    WordSpacing,
    HorizScale,
    Leading,
    Font,
    RenderMode,
    Rise,
    // text positioning
    MoveText,
    MoveTextSetLeading,
    TextMatrix,
    NextLine,
    // text showing
    ShowText,
    ShowTextArray,
    NextLineShowText,
    NextLineShowTextSpaced,
    // XObjects and inline images
    PaintXObject,
    BeginInlineImage,
    InlineImageData,
    EndInlineImage,
    Shading,
    // path construction
    MoveTo,
    LineTo,
    CurveTo,
    CurveToV,
    CurveToY,
    ClosePath,
    Rectangle,
    // path painting
    Stroke,
    CloseStroke,
    Fill,
    FillObsolete,
    FillEvenOdd,
    FillStroke,
    FillStrokeEvenOdd,
    CloseFillStroke,
    CloseFillStrokeEvenOdd,
    EndPath,
    // clipping
    Clip,
    ClipEvenOdd,
    // marked content
    MarkPoint,
    MarkPointProps,
    BeginMarked,
    BeginMarkedProps,
    EndMarked,
    // compatibility
    BeginCompat,
    EndCompat,
    // Type3 glyph metrics
    GlyphWidth,
    GlyphWidthBBox,
}

impl Op {
    /// Operator for a content stream keyword; `None` for unknown keywords.
    pub fn from_keyword(keyword: &str) -> Option<Op> {
        let op = match keyword {
            "q" => Op::Save,
            "Q" => Op::Restore,
            "cm" => Op::ConcatMatrix,
            "w" => Op::LineWidth,
            "J" => Op::LineCap,
            "j" => Op::LineJoin,
            "M" => Op::MiterLimit,
            "d" => Op::Dash,
            "ri" => Op::RenderingIntent,
            "i" => Op::Flatness,
            "gs" => Op::ExtGState,
            "G" => Op::StrokeGray,
            "g" => Op::FillGray,
            "RG" => Op::StrokeRgb,
            "rg" => Op::FillRgb,
            "K" => Op::StrokeCmyk,
            "k" => Op::FillCmyk,
            "CS" => Op::StrokeColorSpace,
            "cs" => Op::FillColorSpace,
            "SC" => Op::StrokeColor,
            "SCN" => Op::StrokeColorN,
            "sc" => Op::FillColor,
            "scn" => Op::FillColorN,
            "BT" => Op::BeginText,
            "ET" => Op::EndText,
            "Tc" => Op::CharSpacing,
            "Tw" => Op::WordSpacing,
            "Tz" => Op::HorizScale,
            "TL" => Op::Leading,
            "Tf" => Op::Font,
            "Tr" => Op::RenderMode,
            "Ts" => Op::Rise,
            "Td" => Op::MoveText,
            "TD" => Op::MoveTextSetLeading,
            "Tm" => Op::TextMatrix,
            "T*" => Op::NextLine,
            "Tj" => Op::ShowText,
            "TJ" => Op::ShowTextArray,
            "'" => Op::NextLineShowText,
            "\"" => Op::NextLineShowTextSpaced,
            "Do" => Op::PaintXObject,
            "BI" => Op::BeginInlineImage,
            "ID" => Op::InlineImageData,
            "EI" => Op::EndInlineImage,
            "sh" => Op::Shading,
            "m" => Op::MoveTo,
            "l" => Op::LineTo,
            "c" => Op::CurveTo,
            "v" => Op::CurveToV,
            "y" => Op::CurveToY,
            "h" => Op::ClosePath,
            "re" => Op::Rectangle,
            "S" => Op::Stroke,
            "s" => Op::CloseStroke,
            "f" => Op::Fill,
            "F" => Op::FillObsolete,
            "f*" => Op::FillEvenOdd,
            "B" => Op::FillStroke,
            "B*" => Op::FillStrokeEvenOdd,
            "b" => Op::CloseFillStroke,
            "b*" => Op::CloseFillStrokeEvenOdd,
            "n" => Op::EndPath,
            "W" => Op::Clip,
            "W*" => Op::ClipEvenOdd,
            "MP" => Op::MarkPoint,
            "DP" => Op::MarkPointProps,
            "BMC" => Op::BeginMarked,
            "BDC" => Op::BeginMarkedProps,
            "EMC" => Op::EndMarked,
            "BX" => Op::BeginCompat,
            "EX" => Op::EndCompat,
            "d0" => Op::GlyphWidth,
            "d1" => Op::GlyphWidthBBox,
            _ => return None,
        };
        Some(op)
    }

    /// Whether the operator positions or shows text, and so only has an
    /// effect inside `BT`/`ET`.
    pub fn needs_text_object(self) -> bool {
        matches!(
            self,
            Op::MoveText
                | Op::MoveTextSetLeading
                | Op::TextMatrix
                | Op::NextLine
                | Op::ShowText
                | Op::ShowTextArray
                | Op::NextLineShowText
                | Op::NextLineShowTextSpaced
        )
    }

    /// Fixed operand count, `None` for operators taking a variable number
    /// (`sc`, `scn`, `SC`, `SCN`) or none at all.
    ///
    /// Operands left over from a preceding unknown keyword sit below these;
    /// only the last `arity` operands belong to the operator.
    pub fn arity(self) -> Option<usize> {
        let n = match self {
            Op::ConcatMatrix | Op::TextMatrix | Op::CurveTo | Op::GlyphWidthBBox => 6,
            Op::StrokeCmyk | Op::FillCmyk | Op::CurveToV | Op::CurveToY | Op::Rectangle => 4,
            Op::StrokeRgb | Op::FillRgb | Op::NextLineShowTextSpaced => 3,
            Op::Dash
            | Op::Font
            | Op::MoveText
            | Op::MoveTextSetLeading
            | Op::MoveTo
            | Op::LineTo
            | Op::MarkPointProps
            | Op::BeginMarkedProps
            | Op::GlyphWidth => 2,
            Op::LineWidth
            | Op::LineCap
            | Op::LineJoin
            | Op::MiterLimit
            | Op::RenderingIntent
            | Op::Flatness
            | Op::ExtGState
            | Op::StrokeGray
            | Op::FillGray
            | Op::StrokeColorSpace
            | Op::FillColorSpace
            | Op::CharSpacing
            | Op::WordSpacing
            | Op::HorizScale
            | Op::Leading
            | Op::RenderMode
            | Op::Rise
            | Op::ShowText
            | Op::ShowTextArray
            | Op::NextLineShowText
            | Op::PaintXObject
            | Op::Shading
            | Op::MarkPoint
            | Op::BeginMarked => 1,
            Op::StrokeColor | Op::StrokeColorN | Op::FillColor | Op::FillColorN => return None,
            _ => 0,
        };
        Some(n)
    }
}
