//! Domain model for Promille.
//!
//! Two entities carry all the state:
//!
//! - [`Drink`] — an immutable record of a single consumption event.
//! - [`Person`] — a mutable aggregate of drinks plus the physiological
//!   attributes (weight, water ratio) the BAC estimate depends on.
//!
//! The blood alcohol estimate is a Widmark-style approximation: total pure
//! alcohol mass is distributed over the body's water mass, expressed in
//! per-mille, then reduced by a fixed metabolic decay per elapsed hour.
//! The result is deliberately **not** clamped at zero — a negative value
//! means the alcohol was fully metabolized some time ago.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Fraction of body mass assumed to be water for women.
pub const WATER_RATIO_FEMALE: f64 = 0.55;

/// Fraction of body mass assumed to be water for men.
pub const WATER_RATIO_MALE: f64 = 0.68;

/// Per-mille of blood alcohol metabolized per hour.
///
/// At this rate, clearing one full per-mille takes a little under six hours.
pub const BAC_DECAY_PER_HOUR: f64 = 0.17;

/// Pure alcohol mass (kg) of one standard drink — a small beer's worth.
pub const STANDARD_DRINK_KG: f64 = 0.01551;

/// A single consumption event.
///
/// Constructed once with a validated volume and strength, stamped with the
/// current time, and never mutated afterwards. One liter of drink is assumed
/// to weigh one kilogram, so alcohol mass comes straight from volume and
/// strength.
#[derive(Debug, Clone)]
pub struct Drink {
    id: Uuid,
    volume: f64,
    strength_percent: f64,
    consumed_at: DateTime<Utc>,
}

impl Drink {
    /// Create a drink consumed right now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVolume`] unless `volume > 0`, and
    /// [`Error::InvalidStrength`] unless `strength_percent` is in `[0, 100]`.
    pub fn new(volume: f64, strength_percent: f64) -> Result<Self> {
        if !(volume > 0.0) {
            return Err(Error::InvalidVolume(volume));
        }
        if !(0.0..=100.0).contains(&strength_percent) {
            return Err(Error::InvalidStrength(strength_percent));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            volume,
            strength_percent,
            consumed_at: Utc::now(),
        })
    }

    /// Unique identifier assigned at construction.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Volume consumed, in liters.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Alcohol by volume, in percent.
    pub fn strength_percent(&self) -> f64 {
        self.strength_percent
    }

    /// When this drink was consumed (set at construction).
    pub fn consumed_at(&self) -> DateTime<Utc> {
        self.consumed_at
    }

    /// Pure alcohol mass in kilograms.
    pub fn alcohol_mass(&self) -> f64 {
        self.volume * (self.strength_percent / 100.0)
    }

    /// How many standard drinks this one event amounts to.
    pub fn standard_drinks(&self) -> f64 {
        self.alcohol_mass() / STANDARD_DRINK_KG
    }

    /// Wall-clock seconds elapsed since consumption, recomputed on each call.
    pub fn seconds_since_consumed(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.consumed_at)
            .num_seconds()
    }
}

impl fmt::Display for Drink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}l ({:.1}%)", self.volume, self.strength_percent)
    }
}

/// A person and their drink history.
///
/// Owns the drinks keyed by drink id, plus the attributes the BAC estimate
/// needs. Weight and the water-ratio flag can be overwritten at any time and
/// take effect on the next computation; no history of previous values is kept.
#[derive(Debug, Clone)]
pub struct Person {
    id: Uuid,
    weight: f64,
    is_female: bool,
    drinks: HashMap<Uuid, Drink>,
}

impl Person {
    /// Create a person with an empty drink history and a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWeight`] unless `weight > 0`. A positive weight
    /// also keeps [`Person::body_water_mass`] away from zero, so the BAC
    /// division is always defined.
    pub fn new(is_female: bool, weight: f64) -> Result<Self> {
        if !(weight > 0.0) {
            return Err(Error::InvalidWeight(weight));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            weight,
            is_female,
            drinks: HashMap::new(),
        })
    }

    /// Unique identifier assigned at construction.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Body weight in kilograms.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Whether the female water ratio applies.
    pub fn is_female(&self) -> bool {
        self.is_female
    }

    /// Gender label derived from the water-ratio flag.
    pub fn gender(&self) -> &'static str {
        if self.is_female { "female" } else { "male" }
    }

    /// Overwrite the body weight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWeight`] unless `weight > 0`; the stored value
    /// is untouched on rejection.
    pub fn set_weight(&mut self, weight: f64) -> Result<()> {
        if !(weight > 0.0) {
            return Err(Error::InvalidWeight(weight));
        }
        self.weight = weight;
        Ok(())
    }

    /// Overwrite the water-ratio flag.
    pub fn set_is_female(&mut self, is_female: bool) {
        self.is_female = is_female;
    }

    /// Consume a drink: build a [`Drink`] stamped now and record it.
    ///
    /// # Errors
    ///
    /// Propagates the volume/strength validation from [`Drink::new`]; nothing
    /// is recorded on rejection.
    pub fn drink(&mut self, volume: f64, strength_percent: f64) -> Result<&Drink> {
        let drink = Drink::new(volume, strength_percent)?;
        Ok(self.add_drink(drink))
    }

    /// Record an already-built drink.
    ///
    /// Drinks are only constructible through the validated [`Drink::new`] and
    /// carry fresh identifiers, so this never overwrites an existing entry.
    pub fn add_drink(&mut self, drink: Drink) -> &Drink {
        let id = drink.id();
        self.drinks.entry(id).or_insert(drink)
    }

    /// Remove a drink by id, returning whether anything was removed.
    ///
    /// An unknown id is a silent no-op — we don't judge why you're deleting
    /// a drink.
    pub fn remove_drink(&mut self, drink_id: Uuid) -> bool {
        self.drinks.remove(&drink_id).is_some()
    }

    /// Number of drinks currently recorded.
    pub fn drink_count(&self) -> usize {
        self.drinks.len()
    }

    /// Total standard-drink equivalents over all recorded drinks.
    pub fn total_standard_drinks(&self) -> f64 {
        self.drinks.values().map(Drink::standard_drinks).sum()
    }

    /// Total pure alcohol mass (kg) over all recorded drinks.
    pub fn total_alcohol_mass(&self) -> f64 {
        self.drinks.values().map(Drink::alcohol_mass).sum()
    }

    /// Fraction of body mass that is water, selected by the female flag.
    pub fn water_ratio(&self) -> f64 {
        if self.is_female {
            WATER_RATIO_FEMALE
        } else {
            WATER_RATIO_MALE
        }
    }

    /// Body water mass in kilograms (equivalently, liters).
    pub fn body_water_mass(&self) -> f64 {
        self.weight * self.water_ratio()
    }

    /// Estimated blood alcohol concentration in per-mille after `hours`
    /// of metabolism.
    ///
    /// Widmark-style: alcohol mass over body water mass, scaled to per-mille,
    /// minus [`BAC_DECAY_PER_HOUR`] for each elapsed hour. Not clamped at
    /// zero — a negative result means "fully metabolized a while ago".
    pub fn blood_alcohol_concentration(&self, hours: f64) -> f64 {
        (self.total_alcohol_mass() / self.body_water_mass()) * 1000.0
            - BAC_DECAY_PER_HOUR * hours
    }

    /// BAC formatted for reading out loud, rounded to two decimals.
    pub fn police_report(&self, hours: f64) -> String {
        format!("{:.2}%.", self.blood_alcohol_concentration(hours))
    }

    /// Drinks sorted ascending by consumption time.
    ///
    /// Computed fresh on each call; always reflects current membership.
    /// Ties keep their map iteration order.
    pub fn ordered_drinks(&self) -> Vec<&Drink> {
        let mut drinks: Vec<&Drink> = self.drinks.values().collect();
        drinks.sort_by_key(|d| d.consumed_at());
        drinks
    }

    /// Seconds elapsed since the *earliest* recorded drink, or 0 with none.
    ///
    /// The first drink anchors elapsed time: this is "time since drinking
    /// began", which is what the decay term models.
    pub fn seconds_since_first_drink(&self) -> i64 {
        self.ordered_drinks()
            .first()
            .map_or(0, |d| d.seconds_since_consumed())
    }

    /// Current BAC, anchored to the time of the first drink.
    pub fn current_blood_alcohol_concentration(&self) -> f64 {
        self.blood_alcohol_concentration(self.seconds_since_first_drink() as f64 / 3600.0)
    }
}

/// Request body for POST /person and PUT /person/{id}.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonRequest {
    /// Whether the female water ratio applies.
    pub is_female: bool,

    /// Body weight in kilograms; must be positive.
    pub weight: f64,
}

/// Request body for POST /person/{id}/drink.
#[derive(Debug, Clone, Deserialize)]
pub struct DrinkRequest {
    /// Volume in liters; must be positive.
    pub volume: f64,

    /// Alcohol by volume in percent; must be within `[0, 100]`.
    pub strength_percent: f64,
}

/// Wire view of a single drink.
#[derive(Debug, Clone, Serialize)]
pub struct DrinkSnapshot {
    pub id: Uuid,
    pub volume: f64,
    pub strength_percent: f64,

    /// Seconds elapsed since this drink was consumed, as of snapshot time.
    pub seconds_since_consumed: i64,

    /// Standard-drink equivalents of this single drink.
    pub standard_drinks: f64,
}

impl DrinkSnapshot {
    fn of(drink: &Drink) -> Self {
        Self {
            id: drink.id(),
            volume: drink.volume(),
            strength_percent: drink.strength_percent(),
            seconds_since_consumed: drink.seconds_since_consumed(),
            standard_drinks: drink.standard_drinks(),
        }
    }
}

/// Wire view of a person, taken at a point in time.
///
/// The drink list is ordered by consumption time and the BAC is the current
/// first-drink-anchored estimate, so two snapshots of the same person taken
/// at different times differ in their elapsed-time fields.
#[derive(Debug, Clone, Serialize)]
pub struct PersonSnapshot {
    pub id: Uuid,
    pub weight: f64,
    pub gender: &'static str,
    pub drinks: Vec<DrinkSnapshot>,

    /// Total standard-drink equivalents over the whole history.
    pub standard_drinks: f64,

    /// Current estimated BAC in per-mille; negative means fully metabolized.
    pub blood_alcohol_concentration: f64,
}

impl PersonSnapshot {
    /// Capture the person's externally visible state right now.
    pub fn of(person: &Person) -> Self {
        Self {
            id: person.id(),
            weight: person.weight(),
            gender: person.gender(),
            drinks: person
                .ordered_drinks()
                .into_iter()
                .map(DrinkSnapshot::of)
                .collect(),
            standard_drinks: person.total_standard_drinks(),
            blood_alcohol_concentration: person.current_blood_alcohol_concentration(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-4,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_water_ratio_follows_flag() {
        let mut person = Person::new(false, 80.0).unwrap();
        assert_eq!(person.water_ratio(), WATER_RATIO_MALE);

        person.set_is_female(true);
        assert_eq!(person.water_ratio(), WATER_RATIO_FEMALE);

        person.set_is_female(false);
        assert_eq!(person.water_ratio(), WATER_RATIO_MALE);
    }

    #[test]
    fn test_drink_validation() {
        assert!(matches!(Drink::new(0.0, 5.0), Err(Error::InvalidVolume(_))));
        assert!(matches!(Drink::new(-0.5, 5.0), Err(Error::InvalidVolume(_))));
        assert!(matches!(
            Drink::new(0.5, -1.0),
            Err(Error::InvalidStrength(_))
        ));
        assert!(matches!(
            Drink::new(0.5, 100.5),
            Err(Error::InvalidStrength(_))
        ));

        // Boundaries: water and pure ethanol are both legal drinks
        assert!(Drink::new(0.5, 0.0).is_ok());
        assert!(Drink::new(0.5, 100.0).is_ok());
    }

    #[test]
    fn test_person_validation() {
        assert!(matches!(
            Person::new(false, 0.0),
            Err(Error::InvalidWeight(_))
        ));
        assert!(matches!(
            Person::new(true, -10.0),
            Err(Error::InvalidWeight(_))
        ));

        let mut person = Person::new(false, 80.0).unwrap();
        assert!(person.set_weight(0.0).is_err());
        // Rejected update leaves the stored value untouched
        assert_eq!(person.weight(), 80.0);

        person.set_weight(75.0).unwrap();
        assert_eq!(person.weight(), 75.0);
    }

    #[test]
    fn test_drink_count_bookkeeping() {
        let mut person = Person::new(false, 80.0).unwrap();
        assert_eq!(person.drink_count(), 0);

        let first = person.drink(0.5, 5.0).unwrap().id();
        person.drink(0.33, 4.7).unwrap();
        assert_eq!(person.drink_count(), 2);

        assert!(person.remove_drink(first));
        assert_eq!(person.drink_count(), 1);

        // Removing the same drink again is a silent no-op
        assert!(!person.remove_drink(first));
        assert_eq!(person.drink_count(), 1);

        // So is removing an id that was never issued
        assert!(!person.remove_drink(Uuid::new_v4()));
        assert_eq!(person.drink_count(), 1);
    }

    #[test]
    fn test_invalid_drink_records_nothing() {
        let mut person = Person::new(false, 80.0).unwrap();
        assert!(person.drink(-1.0, 5.0).is_err());
        assert!(person.drink(0.5, 120.0).is_err());
        assert_eq!(person.drink_count(), 0);
    }

    #[test]
    fn test_ordered_drinks_sorted_by_consumption_time() {
        let mut person = Person::new(false, 80.0).unwrap();
        for _ in 0..10 {
            person.drink(0.1, 5.0).unwrap();
        }

        let ordered = person.ordered_drinks();
        assert_eq!(ordered.len(), 10);
        for pair in ordered.windows(2) {
            assert!(pair[0].consumed_at() <= pair[1].consumed_at());
        }
    }

    #[test]
    fn test_bac_decay_slope() {
        let mut person = Person::new(false, 80.0).unwrap();
        person.drink(0.5, 5.0).unwrap();

        let at_zero = person.blood_alcohol_concentration(0.0);
        for hours in [1.0, 2.0, 5.5, 24.0] {
            assert_close(
                person.blood_alcohol_concentration(hours),
                at_zero - BAC_DECAY_PER_HOUR * hours,
            );
        }
    }

    #[test]
    fn test_bac_scenario_male() {
        // 80 kg male, one 0.5 l beer at 5%
        let mut person = Person::new(false, 80.0).unwrap();
        person.drink(0.5, 5.0).unwrap();

        assert_close(person.total_alcohol_mass(), 0.025);
        assert_close(person.body_water_mass(), 54.4);
        assert_close(
            person.blood_alcohol_concentration(0.0),
            0.025 / 54.4 * 1000.0,
        );
        // Two hours later the decay term has eaten 0.34 per-mille
        assert_close(
            person.blood_alcohol_concentration(2.0),
            0.025 / 54.4 * 1000.0 - 0.34,
        );
    }

    #[test]
    fn test_bac_scenario_female() {
        // 60 kg female, a small beer and a shot
        let mut person = Person::new(true, 60.0).unwrap();
        person.drink(0.33, 5.0).unwrap();
        person.drink(0.04, 40.0).unwrap();

        assert_close(person.total_alcohol_mass(), 0.0325);
        assert_close(person.body_water_mass(), 33.0);
        assert_close(
            person.blood_alcohol_concentration(0.0),
            0.0325 / 33.0 * 1000.0,
        );
    }

    #[test]
    fn test_negative_bac_is_permitted() {
        // Long after the last drink the unclamped estimate goes negative
        let mut person = Person::new(false, 80.0).unwrap();
        person.drink(0.5, 5.0).unwrap();

        let bac = person.blood_alcohol_concentration(48.0);
        assert!(bac < 0.0);
        assert_close(bac, 0.025 / 54.4 * 1000.0 - BAC_DECAY_PER_HOUR * 48.0);
    }

    #[test]
    fn test_seconds_since_first_drink_without_drinks() {
        let person = Person::new(false, 80.0).unwrap();
        assert_eq!(person.seconds_since_first_drink(), 0);
        // No drinks and no elapsed time, so the current estimate is zero
        assert_close(person.current_blood_alcohol_concentration(), 0.0);
    }

    #[test]
    fn test_current_bac_matches_first_drink_anchor() {
        let mut person = Person::new(false, 80.0).unwrap();
        person.drink(0.5, 5.0).unwrap();

        // Just consumed, so elapsed hours are ~0 and the two forms agree
        assert_close(
            person.current_blood_alcohol_concentration(),
            person.blood_alcohol_concentration(0.0),
        );
    }

    #[test]
    fn test_standard_drinks() {
        let drink = Drink::new(0.33, 4.7).unwrap();
        assert_close(drink.alcohol_mass(), 0.33 * 0.047);
        assert_close(drink.standard_drinks(), 0.33 * 0.047 / STANDARD_DRINK_KG);
    }

    #[test]
    fn test_drink_display() {
        let drink = Drink::new(0.5, 5.0).unwrap();
        assert_eq!(drink.to_string(), "0.50l (5.0%)");
    }

    #[test]
    fn test_police_report_format() {
        let mut person = Person::new(false, 80.0).unwrap();
        person.drink(0.5, 5.0).unwrap();
        assert_eq!(person.police_report(0.0), "0.46%.");
    }

    #[test]
    fn test_snapshot_reflects_person() {
        let mut person = Person::new(true, 60.0).unwrap();
        person.drink(0.33, 5.0).unwrap();
        person.drink(0.04, 40.0).unwrap();

        let snapshot = PersonSnapshot::of(&person);
        assert_eq!(snapshot.id, person.id());
        assert_eq!(snapshot.gender, "female");
        assert_eq!(snapshot.drinks.len(), 2);
        assert_close(snapshot.standard_drinks, person.total_standard_drinks());
        for pair in snapshot.drinks.windows(2) {
            // Earlier drinks have been sitting longer
            assert!(pair[0].seconds_since_consumed >= pair[1].seconds_since_consumed);
        }
    }
}
