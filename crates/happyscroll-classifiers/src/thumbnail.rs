//! C3 — Thumbnail analyzer.
//!
//! Submits a thumbnail URL to the image-safety classifier and maps its
//! categorical likelihoods to a boolean verdict + reason (§4.3).
//!
//! Grounded on this codebase's `GeminiClient` shape (a `reqwest::Client` +
//! API key, one request/response pair of structs, JSON body construction)
//! generalized from a scene-generation prompt to an image SafeSearch-style
//! classification call.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use happyscroll_core::model::BranchResult;

/// Deadline for the classifier call (§5, recommended 30s).
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_BASE_URL: &str = "https://vision.googleapis.com/v1";

/// Ordered likelihood scale (§4.3). Derive order matches declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Likelihood {
    VeryUnlikely,
    Unlikely,
    Possible,
    Likely,
    VeryLikely,
}

impl Likelihood {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "VERY_UNLIKELY" => Some(Self::VeryUnlikely),
            "UNLIKELY" => Some(Self::Unlikely),
            "POSSIBLE" => Some(Self::Possible),
            "LIKELY" => Some(Self::Likely),
            "VERY_LIKELY" => Some(Self::VeryLikely),
            _ => None,
        }
    }
}

impl std::fmt::Display for Likelihood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::VeryUnlikely => "very_unlikely",
            Self::Unlikely => "unlikely",
            Self::Possible => "possible",
            Self::Likely => "likely",
            Self::VeryLikely => "very_likely",
        };
        write!(f, "{s}")
    }
}

/// The fixed category set the classifier reports over (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Adult,
    Violence,
    Racy,
    Medical,
    Spoof,
}

impl Category {
    /// Categories that force `safe=false` at/above threshold. `medical` and
    /// `spoof` are informational only (§9 Open Question decision).
    const FORCE_FAIL: [Category; 3] = [Category::Adult, Category::Violence, Category::Racy];

    fn label(self) -> &'static str {
        match self {
            Self::Adult => "adult",
            Self::Violence => "violence",
            Self::Racy => "racy",
            Self::Medical => "medical",
            Self::Spoof => "spoof",
        }
    }

    fn forces_fail(self) -> bool {
        Self::FORCE_FAIL.contains(&self)
    }
}

#[derive(Debug, Clone, Copy)]
struct CategoryLikelihoods {
    adult: Likelihood,
    violence: Likelihood,
    racy: Likelihood,
    medical: Likelihood,
    spoof: Likelihood,
}

impl CategoryLikelihoods {
    fn get(&self, category: Category) -> Likelihood {
        match category {
            Category::Adult => self.adult,
            Category::Violence => self.violence,
            Category::Racy => self.racy,
            Category::Medical => self.medical,
            Category::Spoof => self.spoof,
        }
    }

    fn all() -> [Category; 5] {
        [Category::Adult, Category::Violence, Category::Racy, Category::Medical, Category::Spoof]
    }
}

#[derive(Debug, Clone)]
pub struct ThumbnailAnalyzerConfig {
    pub api_key: String,
    pub base_url: String,
    /// Configurable threshold (§4.3, §6.2 `IMAGE_SAFETY_THRESHOLD`). Default `Possible`.
    pub threshold: Likelihood,
}

impl ThumbnailAnalyzerConfig {
    pub fn from_env() -> Self {
        let threshold = std::env::var("IMAGE_SAFETY_THRESHOLD")
            .ok()
            .and_then(|v| Likelihood::parse(&v))
            .unwrap_or(Likelihood::Possible);
        Self {
            api_key: std::env::var("IMAGE_CLASSIFIER_API_KEY").unwrap_or_default(),
            base_url: std::env::var("IMAGE_CLASSIFIER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            threshold,
        }
    }
}

#[derive(Clone)]
pub struct ThumbnailAnalyzer {
    http: Client,
    config: ThumbnailAnalyzerConfig,
}

impl ThumbnailAnalyzer {
    pub fn new(config: ThumbnailAnalyzerConfig) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client config is static and valid");
        Self { http, config }
    }

    /// Submit `thumbnail_url` for classification and produce the branch
    /// outcome. Never returns an `Err` — any failure is captured into
    /// `BranchResult::Err` per §4.5/§7's propagation policy.
    pub async fn analyze(&self, thumbnail_url: &str) -> BranchResult {
        match self.call_classifier(thumbnail_url).await {
            Ok(likelihoods) => self.apply_threshold(likelihoods),
            Err(kind_and_detail) => {
                let (kind, detail) = kind_and_detail;
                warn!(thumbnail_url = %thumbnail_url, kind = %kind, detail = %detail, "thumbnail classification failed");
                BranchResult::err(kind, detail)
            }
        }
    }

    fn apply_threshold(&self, likelihoods: CategoryLikelihoods) -> BranchResult {
        let flagged: Vec<&'static str> = CategoryLikelihoods::all()
            .into_iter()
            .filter(|c| c.forces_fail() && likelihoods.get(*c) >= self.config.threshold)
            .map(Category::label)
            .collect();

        if flagged.is_empty() {
            BranchResult::ok(true, "thumbnail passed safety review")
        } else {
            BranchResult::ok(false, format!("thumbnail flagged for: {}", flagged.join(", ")))
        }
    }

    async fn call_classifier(&self, thumbnail_url: &str) -> Result<CategoryLikelihoods, (&'static str, String)> {
        let url = format!("{}/images:annotate?key={}", self.config.base_url, self.config.api_key);

        let request = AnnotateRequest {
            requests: vec![ImageAnnotateRequest {
                image: ImageSource { source: ImageSourceUri { image_uri: thumbnail_url.to_string() } },
                features: vec![Feature { feature_type: "SAFE_SEARCH_DETECTION".to_string() }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ("ImageFetchFailed", format!("request to classifier failed: {e}")))?;

        match response.status() {
            StatusCode::OK => {}
            status if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
                return Err(("ClassifierUnavailable", format!("classifier returned {status}")));
            }
            status => return Err(("ClassifierRejected", format!("classifier returned {status}"))),
        }

        let body: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| ("ClassifierUnavailable", format!("malformed classifier response: {e}")))?;

        let annotation = body
            .responses
            .into_iter()
            .next()
            .and_then(|r| r.safe_search_annotation)
            .ok_or_else(|| ("ClassifierRejected", "no annotation in response".to_string()))?;

        let parse = |s: &str| Likelihood::parse(s).unwrap_or(Likelihood::VeryUnlikely);
        Ok(CategoryLikelihoods {
            adult: parse(&annotation.adult),
            violence: parse(&annotation.violence),
            racy: parse(&annotation.racy),
            medical: parse(&annotation.medical),
            spoof: parse(&annotation.spoof),
        })
    }
}

#[derive(Serialize)]
struct AnnotateRequest {
    requests: Vec<ImageAnnotateRequest>,
}

#[derive(Serialize)]
struct ImageAnnotateRequest {
    image: ImageSource,
    features: Vec<Feature>,
}

#[derive(Serialize)]
struct ImageSource {
    source: ImageSourceUri,
}

#[derive(Serialize)]
struct ImageSourceUri {
    #[serde(rename = "imageUri")]
    image_uri: String,
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    feature_type: String,
}

#[derive(Deserialize)]
struct AnnotateResponse {
    responses: Vec<AnnotateResponseItem>,
}

#[derive(Deserialize)]
struct AnnotateResponseItem {
    #[serde(rename = "safeSearchAnnotation")]
    safe_search_annotation: Option<SafeSearchAnnotation>,
}

#[derive(Deserialize)]
struct SafeSearchAnnotation {
    adult: String,
    violence: String,
    racy: String,
    medical: String,
    spoof: String,
}
