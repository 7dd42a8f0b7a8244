use std::io::Cursor;

use chrono::NaiveDate;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::error::ExtractError;
use crate::model::{DishPair, Weekday, WeeklyMenu};
use crate::options::CropLayout;

/// Pixel rectangle, right and bottom exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropBox {
    #[must_use]
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

impl CropLayout {
    /// Meat and vegetarian boxes for a weekday ordinal (0 is Monday).
    ///
    /// Weekend ordinals fail with [`ExtractError::Weekend`]; a layout whose
    /// boxes do not fit into `u32` pixel coordinates is an invalid option.
    pub fn dish_boxes(&self, weekday: u32) -> Result<[CropBox; 2], ExtractError> {
        Weekday::from_ordinal(weekday).ok_or(ExtractError::Weekend(weekday))?;
        let overflow = || {
            ExtractError::InvalidOption(format!(
                "crop layout {self:?} overflows pixel coordinates for weekday {weekday}"
            ))
        };

        let top = self
            .box_height
            .checked_add(self.padding)
            .and_then(|pitch| pitch.checked_mul(weekday))
            .and_then(|offset| offset.checked_add(self.padding_top))
            .ok_or_else(overflow)?;
        let bottom = top.checked_add(self.box_height).ok_or_else(overflow)?;
        let meat_left = self.padding_left;
        let meat_right = meat_left.checked_add(self.box_width).ok_or_else(overflow)?;
        let vegetarian_left = meat_right.checked_add(self.padding).ok_or_else(overflow)?;
        let vegetarian_right = vegetarian_left
            .checked_add(self.box_width)
            .ok_or_else(overflow)?;

        Ok([
            CropBox {
                left: meat_left,
                top,
                right: meat_right,
                bottom,
            },
            CropBox {
                left: vegetarian_left,
                top,
                right: vegetarian_right,
                bottom,
            },
        ])
    }
}

/// Cuts the meat and vegetarian dish images of one weekday out of the
/// rendered weekly menu.
pub fn crop_dishes(
    image: &DynamicImage,
    layout: &CropLayout,
    weekday: u32,
) -> Result<[DynamicImage; 2], ExtractError> {
    let boxes = layout.dish_boxes(weekday)?;

    let (width, height) = (image.width(), image.height());
    for crop in &boxes {
        if crop.right > width || crop.bottom > height {
            return Err(ExtractError::InvalidOption(format!(
                "crop box {},{} to {},{} exceeds the {width}x{height} menu image",
                crop.left, crop.top, crop.right, crop.bottom
            )));
        }
    }
    debug!(weekday, ?boxes, "cropping dish images");

    Ok(boxes.map(|crop| image.crop_imm(crop.left, crop.top, crop.width(), crop.height())))
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, ExtractError> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

/// Dishes of one weekday together with their cropped images.
#[derive(Debug, Clone)]
pub struct DailyDishes {
    pub weekday: Weekday,
    pub dishes: DishPair,
    pub images: [DynamicImage; 2],
}

pub fn daily_dishes(
    menu: &WeeklyMenu,
    image: &DynamicImage,
    layout: &CropLayout,
    weekday: u32,
) -> Result<DailyDishes, ExtractError> {
    let day = Weekday::from_ordinal(weekday).ok_or(ExtractError::Weekend(weekday))?;
    let images = crop_dishes(image, layout, weekday)?;
    let dishes = menu.get(day).cloned().unwrap_or_default();
    Ok(DailyDishes {
        weekday: day,
        dishes,
        images,
    })
}

/// File name under which a dish image of `date` is published; `dish` is 1
/// for meat and 2 for vegetarian.
#[must_use]
pub fn dish_file_name(date: NaiveDate, dish: usize) -> String {
    format!("{}_dish{dish}.png", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use image::DynamicImage;

    use super::{CropBox, crop_dishes, daily_dishes, dish_file_name, encode_png};
    use crate::error::ExtractError;
    use crate::model::{DishPair, Weekday, WeeklyMenu};
    use crate::options::CropLayout;

    #[test]
    fn thursday_boxes_use_default_geometry() {
        let [meat, vegetarian] = CropLayout::default()
            .dish_boxes(3)
            .expect("thursday has dishes");
        assert_eq!(
            meat,
            CropBox {
                left: 118,
                top: 562,
                right: 328,
                bottom: 652
            }
        );
        assert_eq!(vegetarian.left, 337);
        assert_eq!(vegetarian.right, 547);
    }

    #[test]
    fn wednesday_boxes_follow_row_pitch() {
        let [meat, vegetarian] = CropLayout::default()
            .dish_boxes(2)
            .expect("wednesday has dishes");
        assert_eq!((meat.top, meat.bottom), (463, 553));
        assert_eq!((vegetarian.top, vegetarian.left), (463, 337));
    }

    #[test]
    fn weekend_has_no_boxes() {
        let layout = CropLayout::default();
        assert!(matches!(layout.dish_boxes(5), Err(ExtractError::Weekend(5))));
        assert!(matches!(layout.dish_boxes(6), Err(ExtractError::Weekend(6))));

        let image = DynamicImage::new_rgb8(800, 800);
        let error = crop_dishes(&image, &layout, 6).expect_err("sunday has no dishes");
        assert!(matches!(error, ExtractError::Weekend(6)));
    }

    #[test]
    fn crops_dish_images() {
        let image = DynamicImage::new_rgb8(800, 800);
        let [meat, vegetarian] =
            crop_dishes(&image, &CropLayout::default(), 4).expect("friday crops");
        assert_eq!((meat.width(), meat.height()), (210, 90));
        assert_eq!((vegetarian.width(), vegetarian.height()), (210, 90));
        assert!(encode_png(&meat).expect("png").starts_with(b"\x89PNG"));
    }

    #[test]
    fn rejects_images_smaller_than_the_layout() {
        let image = DynamicImage::new_rgb8(300, 300);
        let error = crop_dishes(&image, &CropLayout::default(), 0).expect_err("too small");
        assert!(matches!(error, ExtractError::InvalidOption(_)));
    }

    #[test]
    fn oversized_layout_is_an_invalid_option() {
        let layout: CropLayout = "4294967000,118,9,90,210".parse().expect("layout parses");
        let error = layout.dish_boxes(4).expect_err("boxes overflow");
        assert!(matches!(error, ExtractError::InvalidOption(_)), "{error}");

        let wide: CropLayout = "265,118,9,90,4294967000".parse().expect("layout parses");
        let image = DynamicImage::new_rgb8(800, 800);
        let error = crop_dishes(&image, &wide, 0).expect_err("boxes overflow");
        assert!(matches!(error, ExtractError::InvalidOption(_)), "{error}");
    }

    #[test]
    fn pairs_menu_text_with_images() {
        let mut menu = WeeklyMenu::default();
        menu.insert(
            Weekday::Di,
            DishPair::new(vec!["Fisch".to_string()], vec!["Pasta".to_string()]),
        );
        let image = DynamicImage::new_rgb8(800, 800);
        let daily = daily_dishes(&menu, &image, &CropLayout::default(), 1).expect("tuesday");
        assert_eq!(daily.weekday, Weekday::Di);
        assert_eq!(daily.dishes.meat_text(), "Fisch");
        assert_eq!(daily.images[1].width(), 210);
    }

    #[test]
    fn names_dish_files_by_date() {
        let date = NaiveDate::from_ymd_opt(2024, 10, 17).expect("date");
        assert_eq!(dish_file_name(date, 2), "2024-10-17_dish2.png");
    }
}
