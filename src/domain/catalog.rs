// Static vehicle archetypes shared by the relay and the driving client.

/// One vehicle archetype. Immutable once the catalog is built.
#[derive(Debug, Clone, PartialEq)]
pub struct CarConfig {
    pub id: String,
    pub name: String,
    /// Top forward speed in world units per second.
    pub max_speed: f32,
    /// Speed gained per second while throttling.
    pub acceleration: f32,
    /// Turn authority multiplier.
    pub handling: f32,
}

impl CarConfig {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        max_speed: f32,
        acceleration: f32,
        handling: f32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            max_speed,
            acceleration,
            handling,
        }
    }

    /// Tuning the driving model can integrate: finite values and a positive top speed.
    pub fn is_drivable(&self) -> bool {
        self.max_speed.is_finite()
            && self.max_speed > 0.0
            && self.acceleration.is_finite()
            && self.handling.is_finite()
    }
}

#[derive(Debug, PartialEq)]
pub enum CatalogError {
    Empty,
    DuplicateId(String),
    InvalidCar(String),
}

/// Ordered, non-empty list of car archetypes. The first entry is the default car.
#[derive(Debug, Clone, PartialEq)]
pub struct CarCatalog {
    cars: Vec<CarConfig>,
}

impl CarCatalog {
    pub fn new(cars: Vec<CarConfig>) -> Result<Self, CatalogError> {
        if cars.is_empty() {
            return Err(CatalogError::Empty);
        }
        for (index, car) in cars.iter().enumerate() {
            if !car.is_drivable() {
                return Err(CatalogError::InvalidCar(car.id.clone()));
            }
            if cars[..index].iter().any(|other| other.id == car.id) {
                return Err(CatalogError::DuplicateId(car.id.clone()));
            }
        }
        Ok(Self { cars })
    }

    /// The three stock cars every server ships with.
    pub fn builtin() -> Self {
        Self {
            cars: vec![
                CarConfig::new("falcon", "Falcon GT", 55.0, 28.0, 0.95),
                CarConfig::new("vortex", "Vortex R", 62.0, 26.0, 0.9),
                CarConfig::new("drift", "Drift Queen", 50.0, 30.0, 1.05),
            ],
        }
    }

    pub fn default_car(&self) -> &CarConfig {
        // Non-empty by construction.
        &self.cars[0]
    }

    pub fn get(&self, car_id: &str) -> Option<&CarConfig> {
        self.cars.iter().find(|car| car.id == car_id)
    }

    /// Looks up a car, falling back to the default car for unknown ids.
    pub fn resolve(&self, car_id: &str) -> &CarConfig {
        self.get(car_id).unwrap_or_else(|| self.default_car())
    }

    pub fn cars(&self) -> &[CarConfig] {
        &self.cars
    }

    pub fn len(&self) -> usize {
        self.cars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cars.is_empty()
    }
}

impl Default for CarCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_starts_with_falcon() {
        let catalog = CarCatalog::builtin();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.default_car().id, "falcon");
        assert_eq!(catalog.get("vortex").map(|c| c.max_speed), Some(62.0));
    }

    #[test]
    fn resolve_falls_back_to_first_entry() {
        let catalog = CarCatalog::builtin();
        assert_eq!(catalog.resolve("drift").name, "Drift Queen");
        assert_eq!(catalog.resolve("hovercraft").id, "falcon");
    }

    #[test]
    fn rejects_empty_and_duplicate_catalogs() {
        assert_eq!(CarCatalog::new(Vec::new()), Err(CatalogError::Empty));

        let dup = vec![
            CarConfig::new("a", "A", 10.0, 1.0, 1.0),
            CarConfig::new("a", "A2", 12.0, 1.0, 1.0),
        ];
        assert_eq!(
            CarCatalog::new(dup),
            Err(CatalogError::DuplicateId("a".to_string()))
        );
    }

    #[test]
    fn rejects_cars_the_physics_cannot_drive() {
        for (max_speed, acceleration, handling) in [
            (-10.0, 20.0, 1.0),
            (0.0, 20.0, 1.0),
            (f32::NAN, 20.0, 1.0),
            (50.0, f32::INFINITY, 1.0),
            (50.0, 20.0, f32::NAN),
        ] {
            let cars = vec![
                CarConfig::new("ok", "Ok", 40.0, 20.0, 1.0),
                CarConfig::new("bad", "Bad", max_speed, acceleration, handling),
            ];
            assert_eq!(
                CarCatalog::new(cars),
                Err(CatalogError::InvalidCar("bad".to_string())),
                "max_speed={max_speed} acceleration={acceleration} handling={handling}"
            );
        }
    }

    #[test]
    fn builtin_cars_are_drivable() {
        assert!(CarCatalog::builtin().cars().iter().all(CarConfig::is_drivable));
    }
}
