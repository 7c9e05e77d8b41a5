use crate::models::{LookingFor, Profile, SearchFilter};

/// Check whether a profile belongs to the partition the user is looking for
///
/// This is Stage 1 of the feed pipeline.
#[inline]
pub fn matches_partition(profile: &Profile, looking_for: LookingFor) -> bool {
    match looking_for {
        LookingFor::Roommate => !profile.has_place,
        LookingFor::Place => profile.has_place,
        LookingFor::Both => true,
    }
}

/// Check a profile against the attribute filters (verification, gender,
/// budget and room attributes)
#[inline]
pub fn matches_attributes(profile: &Profile, filter: &SearchFilter) -> bool {
    if filter.verified_only && !profile.is_verified {
        return false;
    }

    // Gender only applies to people, not to listings
    if !profile.has_place && !filter.genders.is_empty() {
        match &profile.gender {
            Some(gender) if filter.genders.iter().any(|g| g.eq_ignore_ascii_case(gender)) => {}
            _ => return false,
        }
    }

    // Profiles without a stated budget are not excluded by a budget range
    if let Some(budget) = profile.monthly_budget {
        if filter.min_budget.is_some_and(|min| budget < min) {
            return false;
        }
        if filter.max_budget.is_some_and(|max| budget > max) {
            return false;
        }
    }

    if profile.has_place {
        if !room_attribute_matches(profile.furnished, filter.furnished)
            || !room_attribute_matches(profile.private_bathroom, filter.private_bathroom)
            || !room_attribute_matches(profile.pets_allowed, filter.pets_allowed)
        {
            return false;
        }
    }

    true
}

/// A required attribute must be present and equal; no requirement always passes
#[inline]
fn room_attribute_matches(actual: Option<bool>, wanted: Option<bool>) -> bool {
    match wanted {
        None => true,
        Some(wanted) => actual == Some(wanted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_seeker(gender: &str, budget: u32) -> Profile {
        Profile {
            gender: Some(gender.to_string()),
            monthly_budget: Some(budget),
            is_verified: true,
            ..Profile::new("seeker", false)
        }
    }

    fn create_listing(rent: u32, furnished: bool) -> Profile {
        Profile {
            monthly_budget: Some(rent),
            furnished: Some(furnished),
            ..Profile::new("listing", true)
        }
    }

    #[test]
    fn test_partition() {
        let seeker = create_seeker("female", 900);
        let listing = create_listing(900, true);

        assert!(matches_partition(&seeker, LookingFor::Roommate));
        assert!(!matches_partition(&listing, LookingFor::Roommate));
        assert!(matches_partition(&listing, LookingFor::Place));
        assert!(!matches_partition(&seeker, LookingFor::Place));
        assert!(matches_partition(&seeker, LookingFor::Both));
        assert!(matches_partition(&listing, LookingFor::Both));
    }

    #[test]
    fn test_gender_filter_skips_listings() {
        let filter = SearchFilter {
            genders: vec!["female".to_string()],
            ..SearchFilter::default()
        };

        assert!(matches_attributes(&create_seeker("Female", 900), &filter));
        assert!(!matches_attributes(&create_seeker("male", 900), &filter));
        assert!(matches_attributes(&create_listing(900, true), &filter));
    }

    #[test]
    fn test_budget_range() {
        let filter = SearchFilter {
            min_budget: Some(500),
            max_budget: Some(1000),
            ..SearchFilter::default()
        };

        assert!(matches_attributes(&create_listing(800, true), &filter));
        assert!(!matches_attributes(&create_listing(1200, true), &filter));
        assert!(!matches_attributes(&create_seeker("male", 400), &filter));
        assert!(matches_attributes(&Profile::new("no-budget", false), &filter));
    }

    #[test]
    fn test_verified_and_room_attributes() {
        let filter = SearchFilter {
            verified_only: true,
            furnished: Some(true),
            ..SearchFilter::default()
        };

        let mut listing = create_listing(800, true);
        assert!(!matches_attributes(&listing, &filter));

        listing.is_verified = true;
        assert!(matches_attributes(&listing, &filter));

        listing.furnished = None;
        assert!(!matches_attributes(&listing, &filter));

        // Room attributes never apply to seekers
        assert!(matches_attributes(&create_seeker("male", 800), &filter));
    }
}
