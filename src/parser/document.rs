//! Source documents and single-page extraction.

use std::path::Path;
use std::sync::Arc;

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use crate::detect::sniff_bytes;
use crate::error::{Error, Result};
use crate::model::{Page, Rotation};

use super::content::{ContentOptions, ContentParser};

/// Letter size, used when a page carries no usable MediaBox.
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// A PDF document opened for table location.
///
/// Holds the raw bytes and the password; every page extraction opens its own
/// lopdf handle, so a `Document` can be shared across threads.
#[derive(Debug, Clone)]
pub struct Document {
    data: Arc<[u8]>,
    password: Option<String>,
    page_count: u32,
    version: String,
}

impl Document {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P, password: Option<&str>) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data, password)
    }

    /// Open a PDF held in memory.
    pub fn from_bytes(data: impl Into<Vec<u8>>, password: Option<&str>) -> Result<Self> {
        let data: Vec<u8> = data.into();
        let header = sniff_bytes(&data)?;
        let doc = load_lopdf(&data, password)?;
        let page_count = doc.get_pages().len() as u32;
        log::debug!("Opened PDF {} with {} pages", header.version, page_count);

        Ok(Self {
            data: data.into(),
            password: password.map(str::to_string),
            page_count,
            version: header.version,
        })
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// PDF version from the header.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Open a private, decrypted lopdf handle.
    pub fn load(&self) -> Result<LopdfDocument> {
        load_lopdf(&self.data, self.password.as_deref())
    }

    /// Copy one page into a new standalone document.
    ///
    /// Every other page is removed and unreachable objects are pruned, so
    /// the result renders and parses without the source.
    pub fn extract_page(&self, page_number: u32) -> Result<SinglePageDocument> {
        let mut doc = self.load()?;
        let pages = doc.get_pages();
        if !pages.contains_key(&page_number) {
            return Err(Error::PageOutOfRange(page_number, pages.len() as u32));
        }

        // Pin inherited attributes before the page tree is trimmed
        let page_id = pages[&page_number];
        let inheritable: [&[u8]; 3] = [b"MediaBox", b"Resources", b"Rotate"];
        for key in inheritable {
            if let Some(value) = inherited_attribute(&doc, page_id, key).cloned() {
                if let Ok(dict) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
                    if !dict.has(key) {
                        dict.set(key.to_vec(), value);
                    }
                }
            }
        }

        // Renderers draw the CropBox while regions are mapped onto the
        // MediaBox, so the two must agree
        let crop_box: Vec<Object> = media_box(&doc, page_id)
            .iter()
            .map(|&v| Object::Real(v as f32))
            .collect();
        if let Ok(dict) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
            dict.set("CropBox", crop_box);
        }

        let others: Vec<u32> = pages.keys().copied().filter(|&n| n != page_number).collect();
        doc.delete_pages(&others);
        doc.prune_objects();
        doc.renumber_objects();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        log::debug!(
            "Extracted page {} ({} bytes)",
            page_number,
            bytes.len()
        );

        Ok(SinglePageDocument {
            page_number,
            bytes,
            rotation: Rotation::None,
        })
    }
}

/// A one-page PDF cut out of a larger document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinglePageDocument {
    page_number: u32,
    bytes: Vec<u8>,
    rotation: Rotation,
}

impl SinglePageDocument {
    /// Wrap serialized single-page PDF bytes.
    pub fn from_bytes(page_number: u32, bytes: Vec<u8>) -> Self {
        Self {
            page_number,
            bytes,
            rotation: Rotation::None,
        }
    }

    /// Page number in the source document (1-indexed).
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Serialized PDF.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Rotation correction applied to this copy.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Artifact file name: `page-<n>.pdf`, or `page-<n>-rotated.pdf` once
    /// a rotation correction was applied.
    pub fn file_name(&self) -> String {
        if self.rotation.is_rotated() {
            format!("page-{}-rotated.pdf", self.page_number)
        } else {
            format!("page-{}.pdf", self.page_number)
        }
    }

    /// Parse the serialized PDF.
    pub fn load(&self) -> Result<LopdfDocument> {
        Ok(LopdfDocument::load_mem(&self.bytes)?)
    }

    /// Load the page with its text lines.
    pub fn page(&self) -> Result<Page> {
        self.page_with_options(ContentOptions::default())
    }

    /// Load the page with custom line grouping.
    pub fn page_with_options(&self, options: ContentOptions) -> Result<Page> {
        let doc = self.load()?;
        ContentParser::with_options(&doc, options).load_page(1, self.page_number)
    }

    /// Write the PDF to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }

    pub(crate) fn with_rotation(&self, bytes: Vec<u8>, rotation: Rotation) -> Self {
        Self {
            page_number: self.page_number,
            bytes,
            rotation,
        }
    }
}

fn load_lopdf(data: &[u8], password: Option<&str>) -> Result<LopdfDocument> {
    let mut doc = LopdfDocument::load_mem(data).map_err(|e| match e {
        lopdf::Error::Decryption(_) => match password {
            Some(_) => Error::InvalidPassword,
            None => Error::Encrypted,
        },
        _ => Error::from(e),
    })?;

    if doc.is_encrypted() {
        let attempt = password.unwrap_or("");
        doc.decrypt(attempt).map_err(|e| {
            log::debug!("Decryption failed: {}", e);
            if password.is_some() {
                Error::InvalidPassword
            } else {
                Error::Encrypted
            }
        })?;
        doc.trailer.remove(b"Encrypt");
    }

    Ok(doc)
}

/// Walk the page tree upward until `key` is found.
pub(crate) fn inherited_attribute<'a>(
    doc: &'a LopdfDocument,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok();
    // Bounded to survive cyclic Parent links
    for _ in 0..32 {
        let dict = current?;
        if let Ok(value) = dict.get(key) {
            return match value {
                Object::Reference(id) => doc.get_object(*id).ok(),
                other => Some(other),
            };
        }
        current = dict
            .get(b"Parent")
            .ok()
            .and_then(|p| p.as_reference().ok())
            .and_then(|id| doc.get_dictionary(id).ok());
    }
    None
}

/// The page's MediaBox as `[x0, y0, x1, y1]`.
pub(crate) fn media_box(doc: &LopdfDocument, page_id: ObjectId) -> [f64; 4] {
    let values: Option<Vec<f64>> = inherited_attribute(doc, page_id, b"MediaBox")
        .and_then(|o| o.as_array().ok())
        .map(|arr| {
            arr.iter()
                .filter_map(|o| match o {
                    Object::Reference(id) => doc.get_object(*id).ok(),
                    other => Some(other),
                })
                .filter_map(super::content::get_number)
                .collect()
        });

    match values.as_deref() {
        Some([x0, y0, x1, y1, ..]) if (x1 - x0).abs() > 0.0 && (y1 - y0).abs() > 0.0 => {
            [*x0, *y0, *x1, *y1]
        }
        _ => {
            log::warn!("Page {:?} has no usable MediaBox, assuming Letter", page_id);
            DEFAULT_MEDIA_BOX
        }
    }
}

/// The page's `/Rotate` entry normalized into `0..360`.
pub(crate) fn page_rotate(doc: &LopdfDocument, page_id: ObjectId) -> i64 {
    inherited_attribute(doc, page_id, b"Rotate")
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(0)
        .rem_euclid(360)
}
