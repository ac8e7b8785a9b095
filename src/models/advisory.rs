use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumIter, EnumString};

/// A parsed security-advisory document.
///
/// Immutable after load; request handlers only ever read it. Unknown
/// fields in the raw document are ignored during decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advisory {
    /// Document-level metadata
    pub document: DocumentMeta,

    /// Product hierarchy named by this advisory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_tree: Option<ProductTree>,

    /// Per-advisory vulnerability records
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vulnerabilities: Vec<Vulnerability>,
}

impl Advisory {
    /// Sensitivity label gating visibility of this advisory
    pub fn label(&self) -> TlpLabel {
        self.document.distribution.tlp.label
    }
}

/// The `document` block: identity, tracking and distribution metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Document category (profile), e.g. `csaf_security_advisory`
    pub category: String,

    /// Human-readable title
    pub title: String,

    /// Issuing party
    pub publisher: Publisher,

    /// Tracking metadata
    pub tracking: Tracking,

    /// Distribution rules (TLP label)
    pub distribution: Distribution,
}

/// Publisher identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publisher {
    pub name: String,

    /// Namespace URI identifying the publisher
    pub namespace: String,

    /// Publisher category, e.g. `vendor`, `coordinator`
    pub category: String,
}

/// Tracking metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tracking {
    /// Publisher-issued tracking identifier
    pub id: String,

    /// Document status
    pub status: TrackingStatus,

    /// Initial release timestamp, RFC 3339. Kept as the raw string and
    /// parsed only when a time-bound filter needs it.
    pub initial_release_date: String,
}

/// Tracking status, a closed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TrackingStatus {
    Draft,
    Final,
    Interim,
}

/// Distribution rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Distribution {
    pub tlp: Tlp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tlp {
    pub label: TlpLabel,
}

/// Traffic Light Protocol label. The set is closed: a document carrying
/// any other value must abort the snapshot load.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum TlpLabel {
    White,
    Green,
    Amber,
    Red,
}

/// Product hierarchy of an advisory
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProductTree {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub full_product_names: Vec<FullProductName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<Branch>,
}

/// A relationship entry; only the referenced product matters for product
/// extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub full_product_name: FullProductName,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A node in the branch hierarchy. A branch either carries a product
/// (leaf) or recurses into child branches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<FullProductName>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branches: Option<Vec<Branch>>,
}

/// A product entry: identifier plus optional identification helpers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullProductName {
    pub product_id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_identification_helper: Option<IdentificationHelper>,
}

/// Identification-helper bundle used for device identity equivalence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentificationHelper {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpe: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashes: Option<Vec<HashCollection>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_numbers: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_numbers: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skus: Option<Vec<String>>,
}

/// File hashes for one artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashCollection {
    pub file_hashes: Vec<FileHash>,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileHash {
    pub algorithm: String,
    pub value: String,
}

/// Per-advisory vulnerability record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vulnerability {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cve: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_status: Option<ProductStatus>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scores: Vec<Score>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remediations: Vec<Remediation>,
}

/// Product-status sets: eight categories, each a set of product
/// identifiers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_affected: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_fixed: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_affected: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_not_affected: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_affected: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub under_investigation: Option<Vec<String>>,
}

impl ProductStatus {
    /// Product identifiers listed under one status category
    pub fn ids_for(&self, category: ProductStatusCategory) -> Option<&[String]> {
        let ids = match category {
            ProductStatusCategory::FirstAffected => &self.first_affected,
            ProductStatusCategory::FirstFixed => &self.first_fixed,
            ProductStatusCategory::Fixed => &self.fixed,
            ProductStatusCategory::KnownAffected => &self.known_affected,
            ProductStatusCategory::KnownNotAffected => &self.known_not_affected,
            ProductStatusCategory::LastAffected => &self.last_affected,
            ProductStatusCategory::Recommended => &self.recommended,
            ProductStatusCategory::UnderInvestigation => &self.under_investigation,
        };
        ids.as_deref()
    }
}

/// The eight product-status categories
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, EnumIter, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProductStatusCategory {
    FirstAffected,
    FirstFixed,
    Fixed,
    KnownAffected,
    KnownNotAffected,
    LastAffected,
    Recommended,
    UnderInvestigation,
}

/// One CVSS score entry; either or both versions may be present
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Score {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvss_v2: Option<Cvss>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvss_v3: Option<Cvss>,
}

/// Numeric CVSS score (the base score is all the filter language needs)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cvss {
    #[serde(rename = "baseScore")]
    pub base_score: f64,
}

/// A remediation entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Remediation {
    pub category: RemediationCategory,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// The five remediation categories
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, EnumIter, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RemediationCategory {
    Mitigation,
    NoFixPlanned,
    NoneAvailable,
    VendorFix,
    Workaround,
}

/// Content hashes keyed by algorithm name (e.g. `sha256`)
pub type ContentHashes = BTreeMap<String, String>;
