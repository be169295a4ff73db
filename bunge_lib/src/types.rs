//! Records produced by the extraction pipeline.

use serde::{Deserialize, Serialize};

/// A profile link discovered on a listing page.
///
/// Identity is the `slug`; within one run each slug appears once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileLink {
    pub slug: String,
    pub url: String,
    pub name: Option<String>,
    /// Thumbnail shown on the listing page, resolved to an absolute URL.
    pub photo_url: Option<String>,
}

/// One member of parliament as parsed from their profile page.
///
/// Built once per profile visit and never modified afterwards. Fields the
/// page did not provide are `None` or empty; only `slug`, `profile_url`,
/// `name` and `wiki_title` are always populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MpRecord {
    pub slug: String,
    pub profile_url: String,
    pub name: String,
    pub county: Option<String>,
    pub constituency: Option<String>,
    pub party: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub committees: Vec<String>,
    pub education: Vec<String>,
    pub employment_history: Vec<String>,
    /// Encyclopedia article title derived from `name`.
    pub wiki_title: String,
}

/// The reduced view of a member stored against their county.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountyMember {
    pub name: String,
    pub constituency: Option<String>,
    pub party: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub wiki_title: String,
    pub profile_url: String,
}

impl From<&MpRecord> for CountyMember {
    fn from(mp: &MpRecord) -> Self {
        Self {
            name: mp.name.clone(),
            constituency: mp.constituency.clone(),
            party: mp.party.clone(),
            email: mp.email.clone(),
            phone: mp.phone.clone(),
            wiki_title: mp.wiki_title.clone(),
            profile_url: mp.profile_url.clone(),
        }
    }
}
