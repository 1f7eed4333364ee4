//! OCR用の画像バリアント生成
//!
//! 同じ図面でも前処理によって読める文字が変わるため、複数のバリアントをOCRに渡す。

use crate::config::Config;
use image::imageops::FilterType;
use image::DynamicImage;

pub const ORIGINAL: &str = "original";

/// 前処理済みの画像1件
#[derive(Debug, Clone)]
pub struct ImageVariant {
    pub name: &'static str,
    pub image: DynamicImage,
}

impl ImageVariant {
    fn new(name: &'static str, image: DynamicImage) -> Self {
        Self { name, image }
    }

    pub fn is_original(&self) -> bool {
        self.name == ORIGINAL
    }
}

/// 原画像・グレースケール・コントラスト強調・シャープ・ぼかし（ノイズ除去）・明るさ補正・拡大
pub fn generate_variants(image: &DynamicImage, config: &Config) -> Vec<ImageVariant> {
    let mut variants = vec![ImageVariant::new(ORIGINAL, image.clone())];
    if !config.generate_variants {
        return variants;
    }

    let gray = image.grayscale();
    variants.push(ImageVariant::new("contrast", gray.adjust_contrast(40.0)));
    variants.push(ImageVariant::new("sharpen", gray.unsharpen(1.5, 5)));
    variants.push(ImageVariant::new("denoise", gray.blur(1.0)));
    variants.push(ImageVariant::new("brighten", image.brighten(30)));
    variants.push(ImageVariant::new("grayscale", gray));

    if config.upscale_factor > 1.0 {
        let width = scaled(image.width(), config.upscale_factor);
        let height = scaled(image.height(), config.upscale_factor);
        variants.push(ImageVariant::new(
            "upscale",
            image.resize_exact(width, height, FilterType::CatmullRom),
        ));
    }

    tracing::debug!(count = variants.len(), "画像バリアントを生成");
    variants
}

fn scaled(length: u32, factor: f32) -> u32 {
    ((length as f32) * factor).round().max(1.0) as u32
}
