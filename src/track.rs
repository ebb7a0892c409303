use serde::{Deserialize, Serialize};

/// Descriptive attributes attached to a track node.
///
/// None of these fields participate in retrieval; they are carried from the
/// source CSV through the store so that downstream tooling can display
/// something friendlier than an opaque id. Every field is optional because
/// the CSV export they come from is sparse.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackAttributes {
    /// Human-readable track name.
    pub name: Option<String>,
    /// External URL (streaming service page, usually).
    pub external_urls: Option<String>,
    /// Release date as found in the export, not parsed or validated.
    pub release_date: Option<String>,
    /// Primary artist name.
    pub artist_name: Option<String>,
    /// Numeric relevance score from the exporting service.
    pub relevance: Option<f64>,
    /// Number of distinct playlists containing this track.
    /// Recomputed on every build, unlike the descriptive fields above.
    pub playlist_count: Option<u32>,
}

impl TrackAttributes {
    /// True when no field carries a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fill a string field only if it is still unset and the incoming value
    /// is non-blank. First occurrence wins, matching how the builder reads
    /// repeated rows for the same track.
    pub fn set_once(field: &mut Option<String>, raw: Option<&str>) {
        if field.is_some() {
            return;
        }
        if let Some(raw) = raw {
            let cleaned = raw.trim();
            if !cleaned.is_empty() {
                *field = Some(cleaned.to_string());
            }
        }
    }

    /// Merge `other` into `self`, keeping existing values.
    /// `playlist_count` is the exception: the incoming count replaces the
    /// stored one, since it is recomputed per build.
    pub fn merge_keep_existing(&mut self, other: &TrackAttributes) {
        if self.name.is_none() {
            self.name = other.name.clone();
        }
        if self.external_urls.is_none() {
            self.external_urls = other.external_urls.clone();
        }
        if self.release_date.is_none() {
            self.release_date = other.release_date.clone();
        }
        if self.artist_name.is_none() {
            self.artist_name = other.artist_name.clone();
        }
        if self.relevance.is_none() {
            self.relevance = other.relevance;
        }
        if other.playlist_count.is_some() {
            self.playlist_count = other.playlist_count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_once_ignores_blank_and_repeat_values() {
        let mut field = None;
        TrackAttributes::set_once(&mut field, Some("   "));
        assert_eq!(field, None);

        TrackAttributes::set_once(&mut field, Some("  Nightswimming "));
        assert_eq!(field.as_deref(), Some("Nightswimming"));

        TrackAttributes::set_once(&mut field, Some("Something Else"));
        assert_eq!(field.as_deref(), Some("Nightswimming"));
    }

    #[test]
    fn merge_keeps_existing_descriptive_fields() {
        let mut attrs = TrackAttributes {
            name: Some("First".to_string()),
            playlist_count: Some(1),
            ..TrackAttributes::default()
        };
        let incoming = TrackAttributes {
            name: Some("Second".to_string()),
            artist_name: Some("Band".to_string()),
            playlist_count: Some(7),
            ..TrackAttributes::default()
        };

        attrs.merge_keep_existing(&incoming);

        assert_eq!(attrs.name.as_deref(), Some("First"));
        assert_eq!(attrs.artist_name.as_deref(), Some("Band"));
        assert_eq!(attrs.playlist_count, Some(7));
    }

    #[test]
    fn default_attributes_are_empty() {
        assert!(TrackAttributes::default().is_empty());
        let named = TrackAttributes {
            name: Some("x".to_string()),
            ..TrackAttributes::default()
        };
        assert!(!named.is_empty());
    }
}
