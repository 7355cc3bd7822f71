use serde::Deserialize;

use super::models::AdvocateDetails;

/// Optional predicates over the joined advocate view, combined with
/// logical AND. Field names match the query string (`?location=Delhi&
/// practiceArea=Family&experience=10%2B&searchQuery=custody`).
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdvocateFilter {
    pub location: Option<String>,
    pub practice_area: Option<String>,
    pub experience: Option<String>,
    pub search_query: Option<String>,
}

/// Parsed form of the `experience` query value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExperienceBand {
    /// `"a-b"`, inclusive on both ends.
    Range(u32, u32),
    /// `"n+"`, at least n years.
    AtLeast(u32),
}

impl ExperienceBand {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(min) = raw.strip_suffix('+') {
            return min.parse().ok().map(ExperienceBand::AtLeast);
        }
        let (low, high) = raw.split_once('-')?;
        match (low.parse(), high.parse()) {
            (Ok(low), Ok(high)) => Some(ExperienceBand::Range(low, high)),
            _ => None,
        }
    }

    fn contains(self, years: u32) -> bool {
        match self {
            ExperienceBand::Range(low, high) => years >= low && years <= high,
            ExperienceBand::AtLeast(min) => years >= min,
        }
    }
}

impl AdvocateFilter {
    pub fn is_empty(&self) -> bool {
        self.location.is_none()
            && self.practice_area.is_none()
            && self.experience.is_none()
            && self.search_query.is_none()
    }

    /// True when the advocate satisfies every supplied predicate. An
    /// unrecognized experience format is a pass-through, not a rejection.
    pub fn matches(&self, advocate: &AdvocateDetails) -> bool {
        if let Some(location) = &self.location {
            let query = location.to_lowercase();
            let city = advocate.location.city.to_lowercase();
            let state = advocate.location.state.to_lowercase();
            if !city.contains(&query) && !state.contains(&query) {
                return false;
            }
        }

        if let Some(practice_area) = &self.practice_area {
            let query = practice_area.to_lowercase();
            if !advocate
                .specialties
                .iter()
                .any(|s| s.name.to_lowercase().contains(&query))
            {
                return false;
            }
        }

        if let Some(experience) = &self.experience {
            if let Some(band) = ExperienceBand::parse(experience) {
                if !band.contains(advocate.advocate.experience) {
                    return false;
                }
            }
        }

        if let Some(search) = &self.search_query {
            let query = search.to_lowercase();
            let in_name = advocate.user.full_name.to_lowercase().contains(&query);
            let in_bio = advocate.advocate.bio.to_lowercase().contains(&query);
            let in_specialty = advocate
                .specialties
                .iter()
                .any(|s| s.name.to_lowercase().contains(&query));
            if !in_name && !in_bio && !in_specialty {
                return false;
            }
        }

        true
    }

    pub fn apply(&self, advocates: Vec<AdvocateDetails>) -> Vec<AdvocateDetails> {
        if self.is_empty() {
            return advocates;
        }
        advocates.into_iter().filter(|a| self.matches(a)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::{Advocate, ContactCard, Location, PracticeArea};

    fn advocate(
        name: &str,
        bio: &str,
        city: &str,
        state: &str,
        experience: u32,
        specialties: &[&str],
    ) -> AdvocateDetails {
        AdvocateDetails {
            advocate: Advocate {
                id: "1".into(),
                user_id: "1".into(),
                location_id: "1".into(),
                bio: bio.into(),
                experience,
                bar_council_number: "DL/1/2010".into(),
                image_url: None,
                rating: 0.0,
                review_count: 0,
                verified: false,
            },
            user: ContactCard {
                full_name: name.into(),
                email: "a@example.com".into(),
                phone: None,
            },
            location: Location {
                id: "1".into(),
                city: city.into(),
                state: state.into(),
                pincode: None,
            },
            specialties: specialties
                .iter()
                .enumerate()
                .map(|(i, name)| PracticeArea {
                    id: (i + 1).to_string(),
                    name: (*name).into(),
                })
                .collect(),
        }
    }

    #[test]
    fn experience_band_parsing() {
        assert_eq!(ExperienceBand::parse("1-3"), Some(ExperienceBand::Range(1, 3)));
        assert_eq!(ExperienceBand::parse("10+"), Some(ExperienceBand::AtLeast(10)));
        assert_eq!(ExperienceBand::parse("senior"), None);
        assert_eq!(ExperienceBand::parse("3-"), None);
        assert_eq!(ExperienceBand::parse(""), None);
    }

    #[test]
    fn at_least_band_is_inclusive() {
        let band = ExperienceBand::parse("10+").unwrap();
        assert!(band.contains(10));
        assert!(band.contains(25));
        assert!(!band.contains(9));
    }

    #[test]
    fn location_matches_city_or_state_substring() {
        let a = advocate("A", "bio", "New Delhi", "Delhi", 5, &[]);
        let filter = AdvocateFilter {
            location: Some("delhi".into()),
            ..Default::default()
        };
        assert!(filter.matches(&a));

        let b = advocate("B", "bio", "Patna", "Bihar", 5, &[]);
        assert!(!filter.matches(&b));
    }

    #[test]
    fn filters_compose_conjunctively() {
        let delhi_senior = advocate("A", "bio", "New Delhi", "Delhi", 12, &["Criminal Law"]);
        let delhi_junior = advocate("B", "bio", "New Delhi", "Delhi", 4, &["Criminal Law"]);
        let bihar_senior = advocate("C", "bio", "Patna", "Bihar", 15, &["Criminal Law"]);

        let filter = AdvocateFilter {
            location: Some("Delhi".into()),
            experience: Some("10+".into()),
            ..Default::default()
        };

        let kept = filter.apply(vec![delhi_senior, delhi_junior, bihar_senior]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].user.full_name, "A");
    }

    #[test]
    fn unrecognized_experience_is_pass_through() {
        let a = advocate("A", "bio", "Mumbai", "Maharashtra", 2, &[]);
        let filter = AdvocateFilter {
            experience: Some("veteran".into()),
            ..Default::default()
        };
        assert!(filter.matches(&a));
    }

    #[test]
    fn search_query_covers_name_bio_and_specialties() {
        let a = advocate("Asha Rao", "property disputes", "Mumbai", "Maharashtra", 7, &["Family Law"]);

        for query in ["asha", "PROPERTY", "family"] {
            let filter = AdvocateFilter {
                search_query: Some(query.into()),
                ..Default::default()
            };
            assert!(filter.matches(&a), "query {:?} should match", query);
        }

        let filter = AdvocateFilter {
            search_query: Some("criminal".into()),
            ..Default::default()
        };
        assert!(!filter.matches(&a));
    }

    #[test]
    fn empty_filter_returns_everything() {
        let list = vec![
            advocate("A", "bio", "Mumbai", "Maharashtra", 7, &[]),
            advocate("B", "bio", "Patna", "Bihar", 2, &[]),
        ];
        let filter = AdvocateFilter::default();
        assert_eq!(filter.apply(list).len(), 2);
    }
}
