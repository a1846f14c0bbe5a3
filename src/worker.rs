//! Runs the controller's side effects off the UI thread and reports back.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use crate::catalog::City;
use crate::forecast::{DailyForecast, ForecastError, ForecastSource};
use crate::locate::{Coordinates, GeolocationError, Locator};

/// Work the controller asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchForecast(City),
    Locate,
}

/// Result of an [`Effect`], delivered back to the event loop.
#[derive(Debug)]
pub enum Outcome {
    Forecast {
        city: City,
        result: Result<Vec<DailyForecast>, ForecastError>,
    },
    Located(Result<Coordinates, GeolocationError>),
}

impl Outcome {
    /// What the controller sees when `effect` could not be started.
    fn not_started(effect: Effect, reason: String) -> Self {
        match effect {
            Effect::FetchForecast(city) => Outcome::Forecast {
                city,
                result: Err(ForecastError::NotStarted { reason }),
            },
            Effect::Locate => Outcome::Located(Err(GeolocationError::Other)),
        }
    }
}

pub struct Worker {
    forecasts: Arc<dyn ForecastSource>,
    locator: Option<Arc<dyn Locator>>,
    tx: Sender<Outcome>,
}

impl Worker {
    pub fn new(
        forecasts: Arc<dyn ForecastSource>,
        locator: Option<Arc<dyn Locator>>,
    ) -> (Self, Receiver<Outcome>) {
        let (tx, rx) = mpsc::channel();
        let worker = Self {
            forecasts,
            locator,
            tx,
        };
        (worker, rx)
    }

    /// Starts `effect` on its own thread. Each effect is independent; results
    /// arrive in completion order.
    pub fn run(&self, effect: Effect) {
        let tx = self.tx.clone();
        let pending = effect.clone();
        let spawned = match effect {
            Effect::FetchForecast(city) => {
                let source = Arc::clone(&self.forecasts);
                thread::Builder::new()
                    .name("forecast".to_string())
                    .spawn(move || {
                        let result = source.fetch(&city);
                        // the receiver is gone once the UI has exited
                        let _ = tx.send(Outcome::Forecast { city, result });
                    })
            }
            Effect::Locate => match &self.locator {
                Some(locator) => {
                    let locator = Arc::clone(locator);
                    thread::Builder::new()
                        .name("locate".to_string())
                        .spawn(move || {
                            let _ = tx.send(Outcome::Located(locator.locate()));
                        })
                }
                None => {
                    let _ = tx.send(Outcome::Located(Err(GeolocationError::Unsupported)));
                    return;
                }
            },
        };
        if let Err(e) = spawned {
            tracing::error!("failed to start worker thread: {e}");
            let _ = self.tx.send(Outcome::not_started(pending, e.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::DeniedLocator;
    use std::time::Duration;

    struct Flat;

    impl ForecastSource for Flat {
        fn fetch(&self, _city: &City) -> Result<Vec<DailyForecast>, ForecastError> {
            Ok(vec![DailyForecast {
                date: "2024-01-01".to_string(),
                temp_max_c: 1.0,
                temp_min_c: 0.0,
            }])
        }
    }

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_fetch_reports_city_and_result() {
        let (worker, rx) = Worker::new(Arc::new(Flat), None);
        worker.run(Effect::FetchForecast(City::new("Казань", 55.7942, 49.1115)));
        match rx.recv_timeout(WAIT).unwrap() {
            Outcome::Forecast { city, result } => {
                assert_eq!(city.name, "Казань");
                assert_eq!(result.unwrap().len(), 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_not_started_outcomes_carry_errors() {
        let city = City::new("Казань", 55.7942, 49.1115);
        match Outcome::not_started(Effect::FetchForecast(city), "no threads".to_string()) {
            Outcome::Forecast { city, result } => {
                assert_eq!(city.name, "Казань");
                let err = result.unwrap_err();
                assert!(matches!(err, ForecastError::NotStarted { .. }));
                assert_eq!(err.to_string(), "Failed to load weather data");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(matches!(
            Outcome::not_started(Effect::Locate, "no threads".to_string()),
            Outcome::Located(Err(GeolocationError::Other))
        ));
    }

    #[test]
    fn test_locate_without_locator_is_unsupported() {
        let (worker, rx) = Worker::new(Arc::new(Flat), None);
        worker.run(Effect::Locate);
        assert!(matches!(
            rx.recv_timeout(WAIT).unwrap(),
            Outcome::Located(Err(GeolocationError::Unsupported))
        ));
    }

    #[test]
    fn test_locate_uses_locator() {
        let (worker, rx) = Worker::new(Arc::new(Flat), Some(Arc::new(DeniedLocator)));
        worker.run(Effect::Locate);
        assert!(matches!(
            rx.recv_timeout(WAIT).unwrap(),
            Outcome::Located(Err(GeolocationError::PermissionDenied))
        ));
    }
}
