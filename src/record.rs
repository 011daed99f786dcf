// Record model: the collectible car, its enums, valuation, and the
// test-injectable live-instance counter.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

// ============================================================================
// ENUMS
// ============================================================================

/// Kind of collectible car.
///
/// Variant order is the wire order: the binary codec stores the variant
/// index, and group-by results iterate keys in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CarType {
    ScaleModel,
    DieCast,
    RadioControlled,
    ElectricModel,
    CustomBuild,
}

impl CarType {
    pub const ALL: [CarType; 5] = [
        CarType::ScaleModel,
        CarType::DieCast,
        CarType::RadioControlled,
        CarType::ElectricModel,
        CarType::CustomBuild,
    ];

    /// Canonical label, as written to the delimited-text format.
    pub fn as_str(&self) -> &'static str {
        match self {
            CarType::ScaleModel => "Scale Model",
            CarType::DieCast => "Die Cast",
            CarType::RadioControlled => "Radio Controlled",
            CarType::ElectricModel => "Electric Model",
            CarType::CustomBuild => "Custom Build",
        }
    }

    /// Exact inverse of [`as_str`](Self::as_str).
    pub fn parse_label(label: &str) -> Option<CarType> {
        CarType::ALL.iter().copied().find(|t| t.as_str() == label)
    }

    /// Lenient variant used by the text importer: unknown labels fall back
    /// to `ScaleModel` so a single odd row never sinks a whole import.
    pub fn parse_label_lenient(label: &str) -> CarType {
        CarType::parse_label(label).unwrap_or(CarType::ScaleModel)
    }

    /// Variant index as stored in the binary format.
    pub fn wire_index(&self) -> u32 {
        *self as u32
    }

    pub fn from_wire_index(index: u32) -> Option<CarType> {
        CarType::ALL.get(index as usize).copied()
    }
}

impl fmt::Display for CarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for CarType {
    fn default() -> Self {
        CarType::ScaleModel
    }
}

/// Physical condition of a record, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Condition {
    Mint,
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Condition {
    pub const ALL: [Condition; 5] = [
        Condition::Mint,
        Condition::Excellent,
        Condition::Good,
        Condition::Fair,
        Condition::Poor,
    ];

    /// Canonical label, as written to the delimited-text format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Mint => "Mint",
            Condition::Excellent => "Excellent",
            Condition::Good => "Good",
            Condition::Fair => "Fair",
            Condition::Poor => "Poor",
        }
    }

    /// Exact inverse of [`as_str`](Self::as_str).
    pub fn parse_label(label: &str) -> Option<Condition> {
        Condition::ALL.iter().copied().find(|c| c.as_str() == label)
    }

    /// Lenient variant used by the text importer: unknown labels fall back
    /// to `Good`.
    pub fn parse_label_lenient(label: &str) -> Condition {
        Condition::parse_label(label).unwrap_or(Condition::Good)
    }

    /// Variant index as stored in the binary format.
    pub fn wire_index(&self) -> u32 {
        *self as u32
    }

    pub fn from_wire_index(index: u32) -> Option<Condition> {
        Condition::ALL.get(index as usize).copied()
    }

    /// Valuation multiplier applied to the raw price.
    pub fn multiplier(&self) -> f64 {
        match self {
            Condition::Mint => MINT_CONDITION_BONUS,
            Condition::Excellent => 1.1,
            Condition::Good => 1.0,
            Condition::Fair => 0.8,
            Condition::Poor => 0.5,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for Condition {
    fn default() -> Self {
        Condition::Good
    }
}

// ============================================================================
// LIVE-INSTANCE COUNTER
// ============================================================================

/// Counts live tracked records.
///
/// This is an explicit injected value, not process-global state: whoever
/// wants the count (typically a test harness) creates a counter and builds
/// records through [`Car::tracked`]. Clones of a tracked record increment
/// the count and drops decrement it.
#[derive(Debug, Clone, Default)]
pub struct InstanceCounter {
    live: Rc<Cell<usize>>,
}

impl InstanceCounter {
    pub fn new() -> Self {
        InstanceCounter::default()
    }

    /// Number of currently live records built through this counter.
    pub fn live(&self) -> usize {
        self.live.get()
    }
}

/// Guard held by a tracked record. Never participates in equality,
/// rendering, or serialization.
#[derive(Debug, Default)]
struct Tally {
    live: Option<Rc<Cell<usize>>>,
}

impl Tally {
    fn attached(counter: &InstanceCounter) -> Self {
        counter.live.set(counter.live.get() + 1);
        Tally {
            live: Some(Rc::clone(&counter.live)),
        }
    }
}

impl Clone for Tally {
    fn clone(&self) -> Self {
        if let Some(live) = &self.live {
            live.set(live.get() + 1);
        }
        Tally {
            live: self.live.clone(),
        }
    }
}

impl Drop for Tally {
    fn drop(&mut self) {
        if let Some(live) = &self.live {
            live.set(live.get().saturating_sub(1));
        }
    }
}

// ============================================================================
// CAR RECORD
// ============================================================================

/// Multiplier applied on top of condition for limited-edition records.
pub const RARE_MULTIPLIER: f64 = 1.5;

/// Condition multiplier for mint records.
pub const MINT_CONDITION_BONUS: f64 = 1.3;

/// A record is "valuable" when its calculated value strictly exceeds this.
pub const VALUABLE_THRESHOLD: f64 = 10_000.0;

/// One collectible-car record.
///
/// A record is a plain value: fully independent once constructed, no shared
/// state with other records. Sharing happens one level up, through the
/// container's handles. No field is range-validated; callers that want
/// `price >= 0` or a sane year enforce it themselves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Car {
    pub manufacturer: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub car_type: CarType,
    pub condition: Condition,
    pub scale: String,
    pub color: String,
    pub limited_edition: bool,

    #[serde(skip)]
    tally: Tally,
}

impl Car {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        manufacturer: impl Into<String>,
        model: impl Into<String>,
        year: i32,
        price: f64,
        car_type: CarType,
        condition: Condition,
        scale: impl Into<String>,
        color: impl Into<String>,
        limited_edition: bool,
    ) -> Self {
        Car {
            manufacturer: manufacturer.into(),
            model: model.into(),
            year,
            price,
            car_type,
            condition,
            scale: scale.into(),
            color: color.into(),
            limited_edition,
            tally: Tally::default(),
        }
    }

    /// Construct a record whose lifetime is tracked by `counter`.
    #[allow(clippy::too_many_arguments)]
    pub fn tracked(
        counter: &InstanceCounter,
        manufacturer: impl Into<String>,
        model: impl Into<String>,
        year: i32,
        price: f64,
        car_type: CarType,
        condition: Condition,
        scale: impl Into<String>,
        color: impl Into<String>,
        limited_edition: bool,
    ) -> Self {
        let mut car = Car::new(
            manufacturer,
            model,
            year,
            price,
            car_type,
            condition,
            scale,
            color,
            limited_edition,
        );
        car.tally = Tally::attached(counter);
        car
    }

    /// Replace only the identifying name fields.
    pub fn update_name(&mut self, manufacturer: impl Into<String>, model: impl Into<String>) {
        self.manufacturer = manufacturer.into();
        self.model = model.into();
    }

    /// Replace the four base fields in place.
    pub fn update_base(
        &mut self,
        manufacturer: impl Into<String>,
        model: impl Into<String>,
        year: i32,
        price: f64,
    ) {
        self.update_name(manufacturer, model);
        self.year = year;
        self.price = price;
    }

    /// Replace every field in place.
    #[allow(clippy::too_many_arguments)]
    pub fn update_all(
        &mut self,
        manufacturer: impl Into<String>,
        model: impl Into<String>,
        year: i32,
        price: f64,
        car_type: CarType,
        condition: Condition,
        scale: impl Into<String>,
        color: impl Into<String>,
        limited_edition: bool,
    ) {
        self.update_base(manufacturer, model, year, price);
        self.car_type = car_type;
        self.condition = condition;
        self.scale = scale.into();
        self.color = color.into();
        self.limited_edition = limited_edition;
    }

    /// Estimated market value: raw price scaled by condition, then by the
    /// rare multiplier for limited editions. Pure; no rounding.
    pub fn calculate_value(&self) -> f64 {
        let mut value = self.price * self.condition.multiplier();
        if self.limited_edition {
            value *= RARE_MULTIPLIER;
        }
        value
    }

    /// True iff the calculated value strictly exceeds
    /// [`VALUABLE_THRESHOLD`]. Exactly 10000.0 is not valuable.
    pub fn is_valuable(&self) -> bool {
        self.calculate_value() > VALUABLE_THRESHOLD
    }

    /// Lexicographic ordering by (manufacturer, model, year) ascending.
    ///
    /// Kept as a named method rather than `PartialOrd` because equality
    /// also compares price; the two relations would disagree and break the
    /// `PartialOrd` contract.
    pub fn base_ordering(&self, other: &Car) -> Ordering {
        self.manufacturer
            .cmp(&other.manufacturer)
            .then_with(|| self.model.cmp(&other.model))
            .then_with(|| self.year.cmp(&other.year))
    }
}

/// Structural equality over the four base fields, matching the original
/// record semantics: domain fields do not participate.
impl PartialEq for Car {
    fn eq(&self, other: &Self) -> bool {
        self.manufacturer == other.manufacturer
            && self.model == other.model
            && self.year == other.year
            && self.price == other.price
    }
}

impl fmt::Display for Car {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} ({})", self.manufacturer, self.model, self.year)?;
        writeln!(f, "Type: {}", self.car_type)?;
        writeln!(f, "Condition: {}", self.condition)?;
        writeln!(f, "Scale: {}", self.scale)?;
        writeln!(f, "Color: {}", self.color)?;
        writeln!(
            f,
            "Limited edition: {}",
            if self.limited_edition { "Yes" } else { "No" }
        )?;
        write!(f, "Price: {:.2}", self.price)
    }
}

// ============================================================================
// CAPABILITY TRAITS
// ============================================================================

/// The field-accessor capability set the container needs from any record
/// variant it stores.
pub trait Record {
    fn manufacturer(&self) -> &str;
    fn model(&self) -> &str;
    fn year(&self) -> i32;
    fn price(&self) -> f64;
    fn render(&self) -> String;
}

/// Domain capability for car-specific filters and groupings. Closed by
/// design: only `Car` implements it in this crate, so there is no runtime
/// downcasting and nothing to silently skip.
pub trait CarProps: Record {
    fn car_type(&self) -> CarType;
    fn condition(&self) -> Condition;
}

impl Record for Car {
    fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn year(&self) -> i32 {
        self.year
    }

    fn price(&self) -> f64 {
        self.price
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl CarProps for Car {
    fn car_type(&self) -> CarType {
        self.car_type
    }

    fn condition(&self) -> Condition {
        self.condition
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ferrari() -> Car {
        Car::new(
            "Ferrari",
            "F40",
            1987,
            15000.0,
            CarType::ScaleModel,
            Condition::Mint,
            "1:18",
            "Red",
            true,
        )
    }

    #[test]
    fn test_calculate_value_mint_limited() {
        let car = ferrari();
        // 15000 * 1.3 * 1.5
        assert!((car.calculate_value() - 29250.0).abs() < 1e-9);
        assert!(car.is_valuable());
    }

    #[test]
    fn test_valuation_monotonic_across_conditions() {
        let mut values = Vec::new();
        for cond in Condition::ALL {
            let mut car = ferrari();
            car.condition = cond;
            car.limited_edition = false;
            values.push(car.calculate_value());
        }
        for pair in values.windows(2) {
            assert!(pair[0] > pair[1], "conditions must rank Mint > ... > Poor");
        }
    }

    #[test]
    fn test_valuable_threshold_is_exclusive() {
        let mut car = ferrari();
        car.condition = Condition::Good;
        car.limited_edition = false;
        car.price = 10000.0;
        assert!((car.calculate_value() - 10000.0).abs() < 1e-9);
        assert!(!car.is_valuable());

        car.price = 10000.01;
        assert!(car.is_valuable());
    }

    #[test]
    fn test_equality_uses_base_fields_only() {
        let a = ferrari();
        let mut b = ferrari();
        b.color = "Blue".to_string();
        b.condition = Condition::Poor;
        assert_eq!(a, b);

        b.price = 1.0;
        assert_ne!(a, b);
    }

    #[test]
    fn test_base_ordering_lexicographic() {
        let a = Car::new(
            "Audi",
            "R8",
            2010,
            100.0,
            CarType::DieCast,
            Condition::Good,
            "1:43",
            "Grey",
            false,
        );
        let b = ferrari();
        assert_eq!(a.base_ordering(&b), Ordering::Less);
        assert_eq!(b.base_ordering(&a), Ordering::Greater);
        assert_eq!(a.base_ordering(&a), Ordering::Equal);
    }

    #[test]
    fn test_update_overloads() {
        let mut car = ferrari();
        car.update_name("Porsche", "911");
        assert_eq!(car.manufacturer, "Porsche");
        assert_eq!(car.model, "911");
        assert_eq!(car.year, 1987);

        car.update_base("Lancia", "Delta", 1992, 800.0);
        assert_eq!(car.year, 1992);
        assert_eq!(car.price, 800.0);
        assert_eq!(car.car_type, CarType::ScaleModel);

        car.update_all(
            "Lancia",
            "Delta",
            1992,
            800.0,
            CarType::CustomBuild,
            Condition::Fair,
            "1:24",
            "White",
            false,
        );
        assert_eq!(car.car_type, CarType::CustomBuild);
        assert_eq!(car.condition, Condition::Fair);
        assert!(!car.limited_edition);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = ferrari();
        let mut copy = original.clone();
        copy.update_name("Porsche", "911");
        copy.scale = "1:87".to_string();
        assert_eq!(original.manufacturer, "Ferrari");
        assert_eq!(original.scale, "1:18");
    }

    #[test]
    fn test_display_rendering() {
        let rendered = ferrari().to_string();
        assert!(rendered.starts_with("Ferrari F40 (1987)\n"));
        assert!(rendered.contains("Type: Scale Model"));
        assert!(rendered.contains("Condition: Mint"));
        assert!(rendered.contains("Limited edition: Yes"));
        assert!(rendered.ends_with("Price: 15000.00"));
        // Deterministic
        assert_eq!(rendered, ferrari().to_string());
    }

    #[test]
    fn test_label_round_trip_and_leniency() {
        for t in CarType::ALL {
            assert_eq!(CarType::parse_label(t.as_str()), Some(t));
        }
        for c in Condition::ALL {
            assert_eq!(Condition::parse_label(c.as_str()), Some(c));
        }
        assert_eq!(CarType::parse_label_lenient("Hovercraft"), CarType::ScaleModel);
        assert_eq!(Condition::parse_label_lenient("Pristine"), Condition::Good);
    }

    #[test]
    fn test_wire_index_round_trip() {
        for t in CarType::ALL {
            assert_eq!(CarType::from_wire_index(t.wire_index()), Some(t));
        }
        for c in Condition::ALL {
            assert_eq!(Condition::from_wire_index(c.wire_index()), Some(c));
        }
        assert_eq!(CarType::from_wire_index(99), None);
        assert_eq!(Condition::from_wire_index(5), None);
    }

    #[test]
    fn test_instance_counter_tracks_clones_and_drops() {
        let counter = InstanceCounter::new();
        assert_eq!(counter.live(), 0);

        let a = Car::tracked(
            &counter,
            "Ford",
            "GT40",
            1966,
            5000.0,
            CarType::DieCast,
            Condition::Excellent,
            "1:24",
            "Blue",
            false,
        );
        assert_eq!(counter.live(), 1);

        let b = a.clone();
        assert_eq!(counter.live(), 2);

        drop(a);
        assert_eq!(counter.live(), 1);
        drop(b);
        assert_eq!(counter.live(), 0);
    }

    #[test]
    fn test_untracked_records_do_not_count() {
        let counter = InstanceCounter::new();
        let _car = ferrari();
        assert_eq!(counter.live(), 0);
    }
}
