use crate::error::SigilError;

/// Horizontal anchoring of text relative to the `x` passed to `text`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum TextAlign {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

impl TextAlign {
    /// Offset applied to the text origin for a string `width` pixels wide.
    #[inline]
    pub fn offset(self, width: f32) -> f32 {
        match self {
            TextAlign::Left => 0.0,
            TextAlign::Center => -width * 0.5,
            TextAlign::Right => -width,
        }
    }
}

impl TryFrom<i32> for TextAlign {
    type Error = SigilError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TextAlign::Left),
            1 => Ok(TextAlign::Center),
            2 => Ok(TextAlign::Right),
            other => Err(SigilError::InvalidTextAlign(other)),
        }
    }
}

impl From<TextAlign> for i32 {
    fn from(align: TextAlign) -> Self {
        align as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_outside_range_are_rejected() {
        for bad in [-1, 3, 42, i32::MIN] {
            assert!(matches!(TextAlign::try_from(bad), Err(SigilError::InvalidTextAlign(v)) if v == bad));
        }
        assert_eq!(TextAlign::try_from(1).unwrap(), TextAlign::Center);
        assert_eq!(i32::from(TextAlign::Right), 2);
    }

    #[test]
    fn offsets_shift_left_by_fraction_of_width() {
        assert_eq!(TextAlign::Left.offset(40.0), 0.0);
        assert_eq!(TextAlign::Center.offset(40.0), -20.0);
        assert_eq!(TextAlign::Right.offset(40.0), -40.0);
    }
}
