//! Pure projection of a raw collection onto the filtered view.

use std::{fmt, str::FromStr};

use crate::resource::Resource;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(String),
}

impl StatusFilter {
    pub fn matches(&self, status: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => status == Some(wanted.as_str()),
        }
    }
}

impl From<&str> for StatusFilter {
    fn from(raw: &str) -> Self {
        if raw == shared::domain::status::ALL {
            Self::All
        } else {
            Self::Only(raw.to_string())
        }
    }
}

impl FromStr for StatusFilter {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(raw))
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(shared::domain::status::ALL),
            Self::Only(status) => f.write_str(status),
        }
    }
}

/// Case-insensitive substring match of `query` against any of `fields`.
/// An empty query matches everything.
pub fn matches_query<E: Resource>(item: &E, query: &str, fields: &[&str]) -> bool {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields.iter().any(|field| {
        item.field(field)
            .is_some_and(|value| value.to_lowercase().contains(&needle))
    })
}

pub fn filtered_view<E: Resource>(
    items: &[E],
    status: &StatusFilter,
    query: &str,
    fields: &[&str],
) -> Vec<E> {
    items
        .iter()
        .filter(|item| status.matches(item.status()))
        .filter(|item| matches_query(*item, query, fields))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{status, ResourceId, StaffMember};

    fn staff(id: i64, first: &str, email: &str, state: &str) -> StaffMember {
        StaffMember {
            id: ResourceId::Num(id),
            first_name: Some(first.into()),
            last_name: Some("Karimov".into()),
            email: Some(email.into()),
            role: Some("Admin".into()),
            status: Some(state.into()),
        }
    }

    const FIELDS: &[&str] = &["first_name", "last_name", "email"];

    fn sample() -> Vec<StaffMember> {
        vec![
            staff(1, "Jonibek", "jon@example.uz", status::ACTIVE),
            staff(2, "Dilnoza", "dil@example.uz", status::ON_LEAVE),
            staff(3, "John", "john@mail.ru", status::ACTIVE),
        ]
    }

    fn ids(items: &[StaffMember]) -> Vec<ResourceId> {
        items.iter().map(|item| item.id.clone()).collect()
    }

    #[test]
    fn status_filter_selects_exact_status() {
        let view = filtered_view(&sample(), &StatusFilter::from(status::ON_LEAVE), "", FIELDS);
        assert_eq!(ids(&view), vec![ResourceId::Num(2)]);
    }

    #[test]
    fn status_filter_is_case_sensitive() {
        let view = filtered_view(&sample(), &StatusFilter::from("FAOL"), "", FIELDS);
        assert!(view.is_empty());
    }

    #[test]
    fn all_disables_status_filtering() {
        let items = sample();
        assert_eq!(filtered_view(&items, &StatusFilter::All, "", FIELDS), items);
        assert_eq!(StatusFilter::from("all"), StatusFilter::All);
    }

    #[test]
    fn search_matches_any_field_case_insensitively() {
        let view = filtered_view(&sample(), &StatusFilter::All, "JO", FIELDS);
        assert_eq!(ids(&view), vec![ResourceId::Num(1), ResourceId::Num(3)]);

        let by_email = filtered_view(&sample(), &StatusFilter::All, "mail.ru", FIELDS);
        assert_eq!(ids(&by_email), vec![ResourceId::Num(3)]);
    }

    #[test]
    fn search_and_status_combine() {
        let view = filtered_view(&sample(), &StatusFilter::from(status::ACTIVE), "dil", FIELDS);
        assert!(view.is_empty());
    }

    #[test]
    fn unmatched_query_leaves_raw_collection_intact() {
        let items = sample();
        let view = filtered_view(&items, &StatusFilter::All, "zzz", FIELDS);
        assert!(view.is_empty());
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn projection_is_repeatable() {
        let items = sample();
        let first = filtered_view(&items, &StatusFilter::from(status::ACTIVE), "o", FIELDS);
        let second = filtered_view(&items, &StatusFilter::from(status::ACTIVE), "o", FIELDS);
        assert_eq!(first, second);
        assert_eq!(items, sample());
    }

    #[test]
    fn missing_fields_never_match() {
        let mut item = staff(9, "Ali", "ali@example.uz", status::ACTIVE);
        item.email = None;
        assert!(!matches_query(&item, "example", FIELDS));
        assert!(matches_query(&item, "", FIELDS));
    }
}
