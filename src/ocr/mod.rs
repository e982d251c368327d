pub mod decode;
pub mod engine;
pub mod extract;
pub mod preprocess;
pub mod setup;

pub use decode::decode_frame;
pub use engine::{OcrEngine, TesseractCli};
pub use extract::{parse_loot, LootParse, LootReading};
pub use preprocess::preprocess_for_ocr;
pub use setup::ensure_tesseract;

use anyhow::Result;
use image::{DynamicImage, GrayImage};

/// Processed frame and the text recognized in it.
#[derive(Debug, Clone)]
pub struct OcrOutput {
    pub processed: GrayImage,
    pub text: String,
}

/// High-level function: decoded frame → preprocessed image → digit text.
pub fn extract_text(img: &DynamicImage, threshold: u8, engine: &dyn OcrEngine) -> Result<OcrOutput> {
    let processed = preprocess_for_ocr(img, threshold);
    let text = engine.recognize_digits(&processed)?;
    Ok(OcrOutput { processed, text })
}
