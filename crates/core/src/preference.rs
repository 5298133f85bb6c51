use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use types::{Archetype, DayOfWeek, LecturerId, TimeSlot};

const TOP: f64 = 10.0;

/// Noise-free utility of a (day, period) position for an archetype.
/// `last_period` is the latest period index present in the slot grid.
pub fn base_utility(archetype: Archetype, day: DayOfWeek, period: u32, last_period: u32) -> f64 {
    // 0.0 at the first period of a day, 1.0 at the last
    let frac = if last_period == 0 {
        0.0
    } else {
        f64::from(period) / f64::from(last_period)
    };
    match archetype {
        Archetype::MorningPerson => TOP * (1.0 - frac),
        Archetype::EveningPerson => TOP * frac,
        Archetype::Clusterer => (TOP - 2.0 * f64::from(day.ordinal())).max(0.0),
        Archetype::Spreader => TOP / 2.0 + 2.0 * (1.0 - (frac - 0.5).abs() * 2.0),
        Archetype::Neutral => TOP / 2.0,
    }
}

/// Preference vector over `slots` with independent uniform noise in
/// `[-noise, noise]` per slot.
pub fn preference_vector(archetype: Archetype, slots: &[TimeSlot], noise: f64, seed: u64) -> Vec<f64> {
    let last_period = slots.iter().map(|s| s.period).max().unwrap_or(0);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    slots
        .iter()
        .map(|s| {
            let base = base_utility(archetype, s.day, s.period, last_period);
            if noise > 0.0 {
                base + noise * rng.gen_range(-1.0..=1.0)
            } else {
                base
            }
        })
        .collect()
}

/// Mixes a run seed with the lecturer id (FNV-1a), so every lecturer draws
/// an independent stream that does not depend on input order.
pub fn lecturer_seed(seed: u64, id: &LecturerId) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in id.0.bytes() {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    h ^ seed
}
