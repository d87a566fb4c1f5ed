//! Rendered rows: snapshot merged with overlays

use pa_common::models::{Photo, PhotoStatus, RemovalKind};

use super::GalleryState;

/// One rendered gallery row
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRow {
    pub photo: Photo,
    pub selected: bool,
    pub processing: bool,
    pub removing: Option<RemovalKind>,
    pub selectable: bool,
}

impl PhotoRow {
    pub fn filename(&self) -> &str {
        &self.photo.filename
    }

    /// Shown dimmed: some remote action is in flight
    pub fn is_busy(&self) -> bool {
        self.processing || self.removing.is_some()
    }
}

impl AsRef<Photo> for PhotoRow {
    fn as_ref(&self) -> &Photo {
        &self.photo
    }
}

/// Rows for one tab, in snapshot order
///
/// Membership comes from the snapshot alone; overlays only annotate.
pub fn view(state: &GalleryState, tab: PhotoStatus) -> Vec<PhotoRow> {
    state
        .records(tab)
        .iter()
        .map(|photo| {
            let filename = photo.filename.as_str();
            let processing = state.is_processing(filename);
            let removing = state.removing_kind(filename);
            PhotoRow {
                photo: photo.clone(),
                selected: state.is_selected(filename),
                processing,
                removing,
                selectable: !processing && removing.is_none(),
            }
        })
        .collect()
}
