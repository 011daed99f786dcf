// Generic record container: ordered, index-addressable, shared handles.
//
// Query results (find/filter/group) alias the container's own records:
// mutating a returned handle is visible through the container too. Callers
// that want an independent copy clone the record explicitly. Single
// threaded; no internal locking.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::CollectionError;
use crate::record::{CarProps, CarType, Condition, Record};

/// Shared-ownership handle to a record stored in (or returned from) a
/// collection.
pub type Handle<T> = Rc<RefCell<T>>;

/// Wrap a record value into a fresh handle.
pub fn handle<T>(value: T) -> Handle<T> {
    Rc::new(RefCell::new(value))
}

/// Ordered, mutable sequence of shared records with search, filter, sort,
/// group, and aggregate operations.
///
/// `T` is any record variant exposing the [`Record`] capability set; the
/// car-specific filters and groupings additionally require [`CarProps`].
#[derive(Debug, Default)]
pub struct Collection<T> {
    items: Vec<Handle<T>>,
    name: String,
}

impl<T> Collection<T> {
    /// Create an empty, unnamed collection.
    pub fn new() -> Self {
        Collection {
            items: Vec::new(),
            name: String::new(),
        }
    }

    /// Create an empty collection with a display name.
    pub fn named(name: impl Into<String>) -> Self {
        Collection {
            items: Vec::new(),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Append a record handle. Insertion order is stable and observable
    /// through every query. (A null handle is unrepresentable, so unlike
    /// the historical API this cannot fail.)
    pub fn add(&mut self, item: Handle<T>) {
        self.items.push(item);
    }

    /// Remove and return the handle at `index`, shifting subsequent
    /// elements left.
    pub fn remove_at(&mut self, index: usize) -> Result<Handle<T>, CollectionError> {
        self.check_index(index)?;
        Ok(self.items.remove(index))
    }

    /// Structurally replace the handle at `index` with `item`. This is a
    /// handle swap, not a field-level merge.
    pub fn edit_at(&mut self, index: usize, item: Handle<T>) -> Result<(), CollectionError> {
        self.check_index(index)?;
        self.items[index] = item;
        Ok(())
    }

    /// Shared handle to the record at `index`.
    pub fn at(&self, index: usize) -> Result<Handle<T>, CollectionError> {
        self.check_index(index)?;
        Ok(Rc::clone(&self.items[index]))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Handle<T>> {
        self.items.iter()
    }

    fn check_index(&self, index: usize) -> Result<(), CollectionError> {
        if index >= self.items.len() {
            return Err(CollectionError::OutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(())
    }
}

impl<T: Record> Collection<T> {
    /// Every record whose manufacturer exactly equals `manufacturer`
    /// (case-sensitive), in original order.
    pub fn find_by_manufacturer(&self, manufacturer: &str) -> Vec<Handle<T>> {
        self.items
            .iter()
            .filter(|item| item.borrow().manufacturer() == manufacturer)
            .cloned()
            .collect()
    }

    /// In-place sort by year. Stable: records with equal years keep their
    /// relative order.
    pub fn sort_by_year(&mut self, ascending: bool) {
        self.items.sort_by(|a, b| {
            let ord = a.borrow().year().cmp(&b.borrow().year());
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });
    }

    /// In-place stable sort by raw price (`total_cmp`, so NaN prices sort
    /// deterministically instead of panicking).
    pub fn sort_by_price(&mut self, ascending: bool) {
        self.items.sort_by(|a, b| {
            let ord = a.borrow().price().total_cmp(&b.borrow().price());
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });
    }

    /// In-place stable sort by manufacturer name.
    pub fn sort_by_manufacturer(&mut self, ascending: bool) {
        self.items.sort_by(|a, b| {
            let ord = a.borrow().manufacturer().cmp(b.borrow().manufacturer());
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });
    }

    /// Partition all records into buckets keyed by manufacturer. Keys
    /// iterate in natural (lexicographic) order; each bucket preserves
    /// container order.
    pub fn group_by_manufacturer(&self) -> BTreeMap<String, Vec<Handle<T>>> {
        let mut groups: BTreeMap<String, Vec<Handle<T>>> = BTreeMap::new();
        for item in &self.items {
            let key = item.borrow().manufacturer().to_string();
            groups.entry(key).or_default().push(Rc::clone(item));
        }
        groups
    }

    /// Sum of the raw `price` field across all records. Intentionally not
    /// the condition-adjusted `calculate_value`.
    pub fn total_value(&self) -> f64 {
        self.items.iter().map(|item| item.borrow().price()).sum()
    }
}

impl<T: CarProps> Collection<T> {
    /// Every record in the given condition, exact match, original order.
    pub fn filter_by_condition(&self, condition: Condition) -> Vec<Handle<T>> {
        self.items
            .iter()
            .filter(|item| item.borrow().condition() == condition)
            .cloned()
            .collect()
    }

    /// Every record of the given type, exact match, original order.
    pub fn filter_by_type(&self, car_type: CarType) -> Vec<Handle<T>> {
        self.items
            .iter()
            .filter(|item| item.borrow().car_type() == car_type)
            .cloned()
            .collect()
    }

    /// Partition by car type; keys iterate in declaration order.
    pub fn group_by_type(&self) -> BTreeMap<CarType, Vec<Handle<T>>> {
        let mut groups: BTreeMap<CarType, Vec<Handle<T>>> = BTreeMap::new();
        for item in &self.items {
            let key = item.borrow().car_type();
            groups.entry(key).or_default().push(Rc::clone(item));
        }
        groups
    }

    /// Partition by condition; keys iterate best-first.
    pub fn group_by_condition(&self) -> BTreeMap<Condition, Vec<Handle<T>>> {
        let mut groups: BTreeMap<Condition, Vec<Handle<T>>> = BTreeMap::new();
        for item in &self.items {
            let key = item.borrow().condition();
            groups.entry(key).or_default().push(Rc::clone(item));
        }
        groups
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a Handle<T>;
    type IntoIter = std::slice::Iter<'a, Handle<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Full listing: name, count, aggregate raw total, then every record
/// numbered from 1. Read-only.
impl<T: Record> fmt::Display for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Collection: {} ===", self.name)?;
        writeln!(f, "Records: {}", self.items.len())?;
        writeln!(f, "Total value: {:.2}", self.total_value())?;
        writeln!(f, "========================================")?;

        if self.items.is_empty() {
            return write!(f, "The collection is empty.");
        }

        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}. {}", i + 1, item.borrow().render())?;
            writeln!(f)?;
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Car;

    fn car(manufacturer: &str, model: &str, year: i32, price: f64) -> Handle<Car> {
        handle(Car::new(
            manufacturer,
            model,
            year,
            price,
            CarType::ScaleModel,
            Condition::Good,
            "1:43",
            "Red",
            false,
        ))
    }

    fn sample() -> Collection<Car> {
        let mut c = Collection::named("Test Garage");
        c.add(car("Ford", "GT40", 1966, 5000.0));
        c.add(car("Chevrolet", "Corvette", 1963, 3000.0));
        c.add(car("Ford", "Mustang", 1965, 4000.0));
        c
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let c = sample();
        assert_eq!(c.len(), 3);
        assert_eq!(c.at(0).unwrap().borrow().model, "GT40");
        assert_eq!(c.at(2).unwrap().borrow().model, "Mustang");
    }

    #[test]
    fn test_remove_at_shifts_left() {
        let mut c = sample();
        let removed = c.remove_at(1).unwrap();
        assert_eq!(removed.borrow().model, "Corvette");
        assert_eq!(c.len(), 2);
        assert_eq!(c.at(1).unwrap().borrow().model, "Mustang");
    }

    #[test]
    fn test_index_errors_on_empty_and_undersized() {
        let mut empty: Collection<Car> = Collection::new();
        assert!(matches!(
            empty.at(0),
            Err(CollectionError::OutOfRange { index: 0, len: 0 })
        ));
        assert!(empty.remove_at(0).is_err());
        assert!(empty.edit_at(0, car("X", "Y", 2000, 1.0)).is_err());

        let mut c = sample();
        assert!(matches!(
            c.at(3),
            Err(CollectionError::OutOfRange { index: 3, len: 3 })
        ));
        assert!(c.remove_at(17).is_err());
        // Failed removal must not mutate
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn test_edit_at_replaces_handle() {
        let mut c = sample();
        let replacement = car("Lotus", "Elise", 1996, 2000.0);
        c.edit_at(0, Rc::clone(&replacement)).unwrap();
        assert_eq!(c.at(0).unwrap().borrow().manufacturer, "Lotus");
        assert!(Rc::ptr_eq(&c.at(0).unwrap(), &replacement));
    }

    #[test]
    fn test_clear() {
        let mut c = sample();
        c.clear();
        assert!(c.is_empty());
        assert_eq!(c.total_value(), 0.0);
    }

    #[test]
    fn test_find_by_manufacturer_exact_and_ordered() {
        let c = sample();
        let fords = c.find_by_manufacturer("Ford");
        assert_eq!(fords.len(), 2);
        assert_eq!(fords[0].borrow().model, "GT40");
        assert_eq!(fords[1].borrow().model, "Mustang");

        // Exact, case-sensitive
        assert!(c.find_by_manufacturer("ford").is_empty());
        assert!(c.find_by_manufacturer("For").is_empty());
    }

    #[test]
    fn test_query_results_alias_container_records() {
        let c = sample();
        let fords = c.find_by_manufacturer("Ford");
        fords[0].borrow_mut().price = 9999.0;
        assert_eq!(c.at(0).unwrap().borrow().price, 9999.0);
    }

    #[test]
    fn test_filter_by_condition_and_type() {
        let mut c = sample();
        c.at(1).unwrap().borrow_mut().condition = Condition::Mint;
        c.at(2).unwrap().borrow_mut().car_type = CarType::DieCast;

        let mint = c.filter_by_condition(Condition::Mint);
        assert_eq!(mint.len(), 1);
        assert_eq!(mint[0].borrow().model, "Corvette");

        let die_cast = c.filter_by_type(CarType::DieCast);
        assert_eq!(die_cast.len(), 1);
        assert_eq!(die_cast[0].borrow().model, "Mustang");

        assert!(c.filter_by_condition(Condition::Poor).is_empty());
    }

    #[test]
    fn test_sort_by_year_both_directions() {
        let mut c = sample();
        c.sort_by_year(true);
        let ascending: Vec<i32> = c.iter().map(|h| h.borrow().year).collect();
        assert_eq!(ascending, vec![1963, 1965, 1966]);

        c.sort_by_year(false);
        let descending: Vec<i32> = c.iter().map(|h| h.borrow().year).collect();
        let mut reversed = ascending.clone();
        reversed.reverse();
        assert_eq!(descending, reversed);
    }

    #[test]
    fn test_sort_small_collections_noop() {
        let mut empty: Collection<Car> = Collection::new();
        empty.sort_by_price(true);
        assert!(empty.is_empty());

        let mut single = Collection::new();
        single.add(car("Ford", "GT40", 1966, 5000.0));
        single.sort_by_manufacturer(false);
        assert_eq!(single.len(), 1);
        assert_eq!(single.at(0).unwrap().borrow().model, "GT40");
    }

    #[test]
    fn test_sort_by_price_and_manufacturer() {
        let mut c = sample();
        c.sort_by_price(true);
        let prices: Vec<f64> = c.iter().map(|h| h.borrow().price).collect();
        assert_eq!(prices, vec![3000.0, 4000.0, 5000.0]);

        c.sort_by_manufacturer(true);
        let makers: Vec<String> = c.iter().map(|h| h.borrow().manufacturer.clone()).collect();
        assert_eq!(makers, vec!["Chevrolet", "Ford", "Ford"]);
    }

    #[test]
    fn test_sort_stability_on_equal_keys() {
        let mut c = sample();
        // Both Fords share the key; stable sort keeps GT40 before Mustang.
        c.sort_by_manufacturer(true);
        let fords = c.find_by_manufacturer("Ford");
        assert_eq!(fords[0].borrow().model, "GT40");
        assert_eq!(fords[1].borrow().model, "Mustang");
    }

    #[test]
    fn test_group_by_manufacturer() {
        let c = sample();
        let groups = c.group_by_manufacturer();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["Ford"].len(), 2);
        assert_eq!(groups["Chevrolet"].len(), 1);
        // Natural key order
        let keys: Vec<&String> = groups.keys().collect();
        assert_eq!(keys, vec!["Chevrolet", "Ford"]);
        // Bucket preserves container order
        assert_eq!(groups["Ford"][0].borrow().model, "GT40");
    }

    #[test]
    fn test_group_by_type_and_condition() {
        let mut c = sample();
        c.at(0).unwrap().borrow_mut().car_type = CarType::CustomBuild;
        c.at(1).unwrap().borrow_mut().condition = Condition::Mint;

        let by_type = c.group_by_type();
        assert_eq!(by_type[&CarType::ScaleModel].len(), 2);
        assert_eq!(by_type[&CarType::CustomBuild].len(), 1);

        let by_condition = c.group_by_condition();
        assert_eq!(by_condition[&Condition::Good].len(), 2);
        assert_eq!(by_condition[&Condition::Mint].len(), 1);
        // Best-first key order
        let keys: Vec<&Condition> = by_condition.keys().collect();
        assert_eq!(keys, vec![&Condition::Mint, &Condition::Good]);
    }

    #[test]
    fn test_total_value_sums_raw_price() {
        let mut c = sample();
        // Condition would change calculate_value but must not change totals
        c.at(0).unwrap().borrow_mut().condition = Condition::Poor;
        assert!((c.total_value() - 12000.0).abs() < 1e-9);
    }

    #[test]
    fn test_display_listing() {
        let c = sample();
        let listing = c.to_string();
        assert!(listing.starts_with("=== Collection: Test Garage ==="));
        assert!(listing.contains("Records: 3"));
        assert!(listing.contains("Total value: 12000.00"));
        assert!(listing.contains("1. Ford GT40 (1966)"));
        assert!(listing.contains("3. Ford Mustang (1965)"));

        let empty: Collection<Car> = Collection::named("Empty");
        assert!(empty.to_string().ends_with("The collection is empty."));
    }
}
