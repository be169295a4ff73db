//! County grouping and completeness statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{CountyMember, MpRecord};

/// Key used for members whose county could not be determined.
pub const UNKNOWN_COUNTY: &str = "Unknown";

/// Groups members under their county, preserving input order within each
/// county. Members without a county go under [`UNKNOWN_COUNTY`].
pub fn group_by_county(records: &[MpRecord]) -> BTreeMap<String, Vec<CountyMember>> {
    let mut counties: BTreeMap<String, Vec<CountyMember>> = BTreeMap::new();
    for mp in records {
        let county = mp
            .county
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(UNKNOWN_COUNTY);
        counties
            .entry(county.to_string())
            .or_default()
            .push(CountyMember::from(mp));
    }
    counties
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyCount {
    pub county: String,
    pub members: usize,
}

/// How complete a batch of records is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletenessStats {
    pub total: usize,
    pub with_email: usize,
    pub with_phone: usize,
    pub with_photo: usize,
    pub with_county: usize,
    pub email_pct: f64,
    pub phone_pct: f64,
    pub photo_pct: f64,
    pub county_pct: f64,
    /// Largest counties first, ties broken by name.
    pub top_counties: Vec<CountyCount>,
}

const TOP_COUNTIES: usize = 5;

pub fn completeness(
    records: &[MpRecord],
    by_county: &BTreeMap<String, Vec<CountyMember>>,
) -> CompletenessStats {
    let total = records.len();
    let count = |f: fn(&MpRecord) -> bool| records.iter().filter(|mp| f(mp)).count();

    let with_email = count(|mp| mp.email.is_some());
    let with_phone = count(|mp| mp.phone.is_some());
    let with_photo = count(|mp| mp.photo_url.is_some());
    let with_county = count(|mp| mp.county.is_some());

    let mut top_counties: Vec<CountyCount> = by_county
        .iter()
        .map(|(county, members)| CountyCount {
            county: county.clone(),
            members: members.len(),
        })
        .collect();
    top_counties.sort_by(|a, b| b.members.cmp(&a.members).then_with(|| a.county.cmp(&b.county)));
    top_counties.truncate(TOP_COUNTIES);

    CompletenessStats {
        total,
        with_email,
        with_phone,
        with_photo,
        with_county,
        email_pct: pct(with_email, total),
        phone_pct: pct(with_phone, total),
        photo_pct: pct(with_photo, total),
        county_pct: pct(with_county, total),
        top_counties,
    }
}

/// Percentage rounded to one decimal place; zero for an empty batch.
pub fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 1000.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::derive_wiki_title;

    fn mp(name: &str, county: Option<&str>) -> MpRecord {
        MpRecord {
            slug: name.to_lowercase().replace(' ', "-"),
            profile_url: format!("https://example.test/{}", name),
            name: name.to_string(),
            county: county.map(str::to_string),
            constituency: None,
            party: None,
            email: None,
            phone: None,
            bio: None,
            photo_url: None,
            committees: Vec::new(),
            education: Vec::new(),
            employment_history: Vec::new(),
            wiki_title: derive_wiki_title(name),
        }
    }

    #[test]
    fn missing_county_goes_to_unknown_in_order() {
        let records = vec![
            mp("Alpha", None),
            mp("Bravo", Some("Kisumu")),
            mp("Charlie", Some("")),
            mp("Delta", None),
        ];
        let grouped = group_by_county(&records);

        let unknown: Vec<&str> = grouped[UNKNOWN_COUNTY].iter().map(|m| m.name.as_str()).collect();
        assert_eq!(unknown, vec!["Alpha", "Charlie", "Delta"]);
        assert_eq!(grouped["Kisumu"].len(), 1);
        assert_eq!(grouped.len(), 2);
    }

    #[test]
    fn members_keep_contact_fields() {
        let mut record = mp("Echo", Some("Nakuru"));
        record.email = Some("echo@example.test".into());
        let grouped = group_by_county(&[record]);
        let member = &grouped["Nakuru"][0];
        assert_eq!(member.email.as_deref(), Some("echo@example.test"));
        assert_eq!(member.wiki_title, "Echo_(Kenyan_politician)");
    }

    #[test]
    fn stats_rank_counties() {
        let mut records = vec![
            mp("A", Some("Nairobi")),
            mp("B", Some("Nairobi")),
            mp("C", Some("Mombasa")),
            mp("D", Some("Kiambu")),
        ];
        records[0].email = Some("a@x.test".into());
        records[1].photo_url = Some("https://x.test/b.jpg".into());
        let grouped = group_by_county(&records);
        let stats = completeness(&records, &grouped);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.with_email, 1);
        assert_eq!(stats.email_pct, 25.0);
        assert_eq!(stats.with_photo, 1);
        assert_eq!(stats.top_counties[0].county, "Nairobi");
        assert_eq!(stats.top_counties[0].members, 2);
        assert_eq!(stats.top_counties[1].county, "Kiambu");
    }

    #[test]
    fn pct_rounds_to_one_decimal() {
        assert_eq!(pct(1, 3), 33.3);
        assert_eq!(pct(2, 3), 66.7);
        assert_eq!(pct(0, 0), 0.0);
    }
}
