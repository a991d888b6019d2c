//! Color mapping stages between a raw sampled value and a display color.

use std::cell::RefCell;
use std::rc::Rc;

pub mod color_converter;
pub mod palette;

use self::color_converter::ColorConverter;
use self::palette::Palette;
use crate::Shared;
use crate::color::Color;

/// Maps raw values to display colors and tracks whether that mapping changed.
///
/// A sprite without a mapper uses raw values as colors directly, so "no
/// mapper" is expressed as `Option<ColorMapper>` by its users.
#[derive(Clone, Debug)]
pub enum ColorMapper {
    Palette(Shared<Palette>),
    Converter(Shared<ColorConverter>),
}

impl ColorMapper {
    /// `None` means the raw value is transparent.
    #[must_use]
    pub fn map(&self, raw: u32) -> Option<Color> {
        match self {
            Self::Palette(palette) => palette.borrow().get_color(raw),
            Self::Converter(converter) => converter.borrow().convert(raw),
        }
    }

    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        match self {
            Self::Palette(palette) => palette.borrow().needs_refresh(),
            Self::Converter(converter) => converter.borrow().needs_refresh(),
        }
    }

    pub fn finish_refresh(&self) {
        match self {
            Self::Palette(palette) => palette.borrow_mut().finish_refresh(),
            Self::Converter(converter) => converter.borrow_mut().finish_refresh(),
        }
    }

    /// Whether both handles point at the same mapper.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Palette(a), Self::Palette(b)) => Rc::ptr_eq(a, b),
            (Self::Converter(a), Self::Converter(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Shared<Palette>> for ColorMapper {
    fn from(palette: Shared<Palette>) -> Self {
        Self::Palette(palette)
    }
}

impl From<Palette> for ColorMapper {
    fn from(palette: Palette) -> Self {
        Self::Palette(Rc::new(RefCell::new(palette)))
    }
}

impl From<Shared<ColorConverter>> for ColorMapper {
    fn from(converter: Shared<ColorConverter>) -> Self {
        Self::Converter(converter)
    }
}

impl From<ColorConverter> for ColorMapper {
    fn from(converter: ColorConverter) -> Self {
        Self::Converter(Rc::new(RefCell::new(converter)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared;
    use pretty_assertions::assert_eq;

    #[test]
    fn map_dispatches_on_variant() {
        let mut palette = Palette::new(2);
        palette.set_color(1, 0xFF_FFFF).unwrap();
        palette.make_transparent(0).unwrap();
        let palette = ColorMapper::from(palette);
        let converter = ColorMapper::from(ColorConverter::new());

        assert_eq!(palette.map(0), None);
        assert_eq!(palette.map(1), Some(Color::WHITE));
        assert_eq!(palette.map(2), None);

        assert_eq!(converter.map(0xFF_FFFF), Some(Color::WHITE));
        assert_eq!(converter.map(1), Some(Color::BLACK));
    }

    #[test]
    fn refresh_flag_goes_through_the_handle() {
        let palette = shared(Palette::new(1));
        let mapper = ColorMapper::from(Rc::clone(&palette));

        assert!(mapper.needs_refresh());
        mapper.finish_refresh();
        assert!(!palette.borrow().needs_refresh());

        palette.borrow_mut().set_color(0, 0x00_00FF).unwrap();
        assert!(mapper.needs_refresh());
    }

    #[test]
    fn ptr_eq_compares_handles() {
        let palette = shared(Palette::new(1));
        let a = ColorMapper::from(Rc::clone(&palette));
        let b = ColorMapper::from(palette);
        let c = ColorMapper::from(Palette::new(1));
        let d = ColorMapper::from(ColorConverter::new());

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        assert!(!a.ptr_eq(&d));
    }
}
