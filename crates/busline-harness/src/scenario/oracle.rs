//! Reusable oracle functions.
//!
//! Each function returns an [`OracleFn`] checking one property of a finished
//! run. Combine them with [`all_of`]; [`invariants`] bundles every property
//! that must hold for any valid configuration.

use busline_core::{DeviceId, Phase};

use crate::scenario::{OracleFn, Outcome};

/// Box a closure as an oracle.
pub fn check<F>(oracle: F) -> OracleFn
where
    F: Fn(&Outcome) -> Result<(), String> + 'static,
{
    Box::new(oracle)
}

/// Run every oracle in order, stopping at the first failure.
pub fn all_of(oracles: Vec<OracleFn>) -> OracleFn {
    check(move |outcome| {
        for oracle in &oracles {
            oracle(outcome)?;
        }
        Ok(())
    })
}

/// Every property that holds for a completed run.
pub fn invariants() -> OracleFn {
    all_of(vec![
        completed(),
        attempts_resolve_in_order(),
        request_count_matches(),
        releases_match_grants(),
        arbiter_never_overcommitted(),
        occupancy_within_peak(),
        devices_finish_before_completion(),
    ])
}

/// The run finished without error.
pub fn completed() -> OracleFn {
    check(|outcome| outcome.report().map(|_| ()))
}

/// Each attempt logs `Requesting`, then exactly one of `Granted`/`Forced`,
/// then `Releasing`.
pub fn attempts_resolve_in_order() -> OracleFn {
    check(|outcome| {
        for device in device_ids(outcome) {
            for attempt in 1..=outcome.config.attempts_per_device {
                let phases = outcome.attempt_phases(device, attempt);
                let ok = matches!(
                    phases.as_slice(),
                    [Phase::Requesting, Phase::Granted | Phase::Forced, Phase::Releasing]
                );
                if !ok {
                    return Err(format!(
                        "Scenario '{}': {device} attempt {attempt} logged {phases:?}",
                        outcome.name
                    ));
                }
            }
        }
        Ok(())
    })
}

/// `Requesting` count equals devices × attempts and equals
/// `Granted` + `Forced`.
pub fn request_count_matches() -> OracleFn {
    check(|outcome| {
        let expected = outcome.config.total_attempts();
        let requesting = outcome.count(Phase::Requesting) as u64;
        let resolved = (outcome.count(Phase::Granted) + outcome.count(Phase::Forced)) as u64;

        if requesting != expected || resolved != expected {
            return Err(format!(
                "Scenario '{}': expected {expected} attempts, saw {requesting} requesting and \
                 {resolved} granted/forced",
                outcome.name
            ));
        }
        Ok(())
    })
}

/// One release per grant, none per forced entry, and the permit is back
/// at the end.
pub fn releases_match_grants() -> OracleFn {
    check(|outcome| {
        let report = outcome.report()?;
        let granted = outcome.count(Phase::Granted) as u64;
        let forced = outcome.count(Phase::Forced) as u64;
        let stats = report.arbiter;

        if stats.grants != granted || stats.releases != granted || stats.denials != forced {
            return Err(format!(
                "Scenario '{}': {granted} granted / {forced} forced logged, arbiter saw {stats:?}",
                outcome.name
            ));
        }
        Ok(())
    })
}

/// The arbiter never had more than one permit out.
pub fn arbiter_never_overcommitted() -> OracleFn {
    check(|outcome| {
        let report = outcome.report()?;
        if let Some(bad) = outcome.arbiter_samples.iter().find(|&&n| n > 1) {
            return Err(format!("Scenario '{}': arbiter sampled at {bad}", outcome.name));
        }
        if report.arbiter.peak_outstanding > 1 {
            return Err(format!(
                "Scenario '{}': {} permits outstanding at once",
                outcome.name, report.arbiter.peak_outstanding
            ));
        }
        Ok(())
    })
}

/// Sampled bus occupancy never exceeds the device count or the reported
/// peak.
pub fn occupancy_within_peak() -> OracleFn {
    check(|outcome| {
        let report = outcome.report()?;
        let limit = report.bus.peak_occupancy.min(outcome.config.device_count as usize);
        match outcome.bus_samples.iter().find(|&&n| n > limit) {
            Some(bad) => Err(format!(
                "Scenario '{}': {bad} devices on the bus, peak reported {}",
                outcome.name, report.bus.peak_occupancy
            )),
            None => Ok(()),
        }
    })
}

/// Every device logs `DeviceDone` after its own last event, and a single
/// `SimulationDone` closes the run.
pub fn devices_finish_before_completion() -> OracleFn {
    check(|outcome| {
        for device in device_ids(outcome) {
            let events = outcome.device_events(device);
            let done = events.iter().filter(|e| e.phase == Phase::DeviceDone).count();
            let last = events.last().map(|e| e.phase);
            if done != 1 || last != Some(Phase::DeviceDone) {
                return Err(format!(
                    "Scenario '{}': {device} logged DeviceDone {done} times, last phase {last:?}",
                    outcome.name
                ));
            }
        }

        let completions = outcome.count(Phase::SimulationDone);
        let last = outcome.events.last().map(|e| e.phase);
        if completions != 1 || last != Some(Phase::SimulationDone) {
            return Err(format!(
                "Scenario '{}': SimulationDone logged {completions} times, last phase {last:?}",
                outcome.name
            ));
        }
        Ok(())
    })
}

/// The configuration was refused and no device ever requested the bus.
pub fn rejected_before_spawn() -> OracleFn {
    check(|outcome| {
        if outcome.result.is_ok() {
            return Err(format!("Scenario '{}': invalid config was accepted", outcome.name));
        }
        if !outcome.events.is_empty() {
            return Err(format!(
                "Scenario '{}': {} events logged before rejection",
                outcome.name,
                outcome.events.len()
            ));
        }
        Ok(())
    })
}

fn device_ids(outcome: &Outcome) -> impl Iterator<Item = DeviceId> {
    (1..=outcome.config.device_count).map(DeviceId::new)
}
