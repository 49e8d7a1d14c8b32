use crate::color::Filter;
use crate::error::Result;
use crate::matrix::SparseMatrix;
use serde::{Deserialize, Serialize};

/// A single colored pixel of a drawing.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Pixel {
    pub row: i32,
    pub column: i32,
    pub color: String,
}

impl Pixel {
    pub fn new(row: i32, column: i32, color: impl Into<String>) -> Self {
        Pixel {
            row,
            column,
            color: color.into(),
        }
    }
}

/// A stored pixel-art drawing owned by one user.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Image {
    /// Four-digit id assigned by the store, `None` until saved
    pub id: Option<String>,
    pub user_id: String,
    pub name: String,
    pub pixels: Vec<Pixel>,
    /// Set on images derived through a filter; those cannot be filtered again
    pub edited: bool,
}

impl Image {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, pixels: Vec<Pixel>) -> Self {
        Image {
            id: None,
            user_id: user_id.into(),
            name: name.into(),
            pixels,
            edited: false,
        }
    }

    /// Rebuilds the sparse matrix for this drawing from its flat pixel list.
    pub fn to_matrix(&self) -> SparseMatrix {
        SparseMatrix::from_pixels(
            self.pixels
                .iter()
                .map(|p| (p.row, p.column, p.color.as_str())),
        )
    }

    /// Returns a filtered, unsaved copy named `{name}_{filter}`.
    pub fn apply_filter(&self, filter: Filter) -> Result<Image> {
        let pixels = self
            .pixels
            .iter()
            .map(|p| Ok(Pixel::new(p.row, p.column, filter.apply(&p.color)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Image {
            id: None,
            user_id: self.user_id.clone(),
            name: format!("{}_{}", self.name, filter.name()),
            pixels,
            edited: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filtered_copy_keeps_layout() {
        let image = Image::new(
            "ana",
            "heart",
            vec![Pixel::new(0, 1, "#ff0000"), Pixel::new(1, 0, "#000000")],
        );
        let gray = image.apply_filter(Filter::Grayscale).unwrap();
        assert_eq!(gray.name, "heart_grayscale");
        assert_eq!(gray.user_id, "ana");
        assert!(gray.edited);
        assert!(gray.id.is_none());
        assert_eq!(gray.pixels[0], Pixel::new(0, 1, "#4c4c4c"));
        assert_eq!(gray.pixels[1], Pixel::new(1, 0, "#000000"));
    }

    #[test]
    fn bad_color_fails_the_filter() {
        let image = Image::new("ana", "oops", vec![Pixel::new(0, 0, "red")]);
        assert!(image.apply_filter(Filter::Sepia).is_err());
    }

    #[test]
    fn matrix_keeps_first_duplicate() {
        let image = Image::new(
            "ana",
            "dup",
            vec![Pixel::new(2, 2, "#010101"), Pixel::new(2, 2, "#020202")],
        );
        let matrix = image.to_matrix();
        assert_eq!(matrix.cell_count(), 1);
        assert_eq!(matrix.get(2, 2), Some("#010101"));
    }
}
