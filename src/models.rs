use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ingredient category steering which raw-ingredient imagery the
/// refinement stage leans toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Vegetable,
    Seafood,
    Meat,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Vegetable => "Vegetable",
            Category::Seafood => "Seafood",
            Category::Meat => "Meat",
        }
    }
}

/// Thematic cast for the miniature-scene figurines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerConcept {
    Construction,
    Chef,
    Farmer,
}

impl WorkerConcept {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerConcept::Construction => "Construction",
            WorkerConcept::Chef => "Chef",
            WorkerConcept::Farmer => "Farmer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    ThreeFour,
    #[serde(rename = "4:3")]
    FourThree,
    #[serde(rename = "9:16")]
    NineSixteen,
    #[serde(rename = "16:9")]
    SixteenNine,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::ThreeFour => "3:4",
            AspectRatio::FourThree => "4:3",
            AspectRatio::NineSixteen => "9:16",
            AspectRatio::SixteenNine => "16:9",
        }
    }
}

/// User-selected quality. `Auto` is a UI convenience only and is resolved
/// to a concrete [`ImageSize`] before anything is sent downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Auto,
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl Resolution {
    pub fn resolve(&self) -> ImageSize {
        match self {
            Resolution::Auto | Resolution::OneK => ImageSize::OneK,
            Resolution::TwoK => ImageSize::TwoK,
            Resolution::FourK => ImageSize::FourK,
        }
    }
}

/// Concrete size accepted by the image call. There is no `Auto` here on
/// purpose: the remote service never sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSize {
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::OneK => "1K",
            ImageSize::TwoK => "2K",
            ImageSize::FourK => "4K",
        }
    }
}

/// One submission of the generation form. Constructed fresh per submission
/// and never mutated mid-pipeline.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationRequest {
    pub category: Category,
    pub product_name: String,
    pub worker_concept: WorkerConcept,
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeneratedResult {
    /// Self-contained `data:image/png;base64,...` URI.
    pub image_url: String,
    /// The exact refined prompt the image was generated from.
    pub prompt: String,
    pub generated_at: DateTime<Utc>,
}
