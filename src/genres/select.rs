// Pattern Selection - Random pick of a progression and drum pattern for a genre

use rand::seq::SliceRandom;
use rand::Rng;

use super::types::GenreProfile;
use super::{genre_or_default, DEFAULT_GENRE};

/// Pick one of the genre's chord progressions uniformly at random
///
/// Unregistered genres use the default genre's progressions.
pub fn select_chord_progression<R: Rng + ?Sized>(genre: &str, rng: &mut R) -> Vec<String> {
    let profile = genre_or_default(genre);
    pick(&profile, |p| &p.chord_progressions, rng)
}

/// Pick one of the genre's drum patterns uniformly at random
///
/// Unregistered genres use the default genre's patterns.
pub fn select_drum_pattern<R: Rng + ?Sized>(genre: &str, rng: &mut R) -> Vec<u8> {
    let profile = genre_or_default(genre);
    pick(&profile, |p| &p.drum_patterns, rng)
}

fn pick<T, F, R>(profile: &GenreProfile, table: F, rng: &mut R) -> Vec<T>
where
    T: Clone,
    F: Fn(&GenreProfile) -> &Vec<Vec<T>>,
    R: Rng + ?Sized,
{
    if let Some(choice) = table(profile).choose(rng) {
        return choice.clone();
    }

    // Registered genre with an empty table
    let fallback = genre_or_default(DEFAULT_GENRE);
    table(&fallback).choose(rng).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genres::get_genre;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_progression_comes_from_genre() {
        let mut rng = StdRng::seed_from_u64(7);
        let jazz = get_genre("jazz").unwrap();

        for _ in 0..20 {
            let progression = select_chord_progression("jazz", &mut rng);
            assert!(jazz.chord_progressions.contains(&progression));
        }
    }

    #[test]
    fn test_drum_pattern_comes_from_genre() {
        let mut rng = StdRng::seed_from_u64(7);
        let classical = get_genre("classical").unwrap();

        for _ in 0..20 {
            let pattern = select_drum_pattern("classical", &mut rng);
            assert!(classical.drum_patterns.contains(&pattern));
        }
    }

    #[test]
    fn test_unknown_genre_uses_rock() {
        let mut rng = StdRng::seed_from_u64(3);
        let rock = get_genre("rock").unwrap();

        let progression = select_chord_progression("polka", &mut rng);
        assert!(rock.chord_progressions.contains(&progression));

        let pattern = select_drum_pattern("polka", &mut rng);
        assert!(rock.drum_patterns.contains(&pattern));
    }

    #[test]
    fn test_selection_covers_all_candidates() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = std::collections::HashSet::new();

        for _ in 0..200 {
            seen.insert(select_chord_progression("rock", &mut rng));
        }

        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_same_seed_same_choice() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);

        assert_eq!(
            select_chord_progression("electronica", &mut a),
            select_chord_progression("electronica", &mut b)
        );
    }
}
