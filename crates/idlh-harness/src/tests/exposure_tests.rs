use super::*;

fn exposed(value: &str) -> ExtAttr {
    ExtAttr::with_identifier("Exposed", value)
}

#[test]
fn test_default_is_window() {
    let set = ExposureSet::from_ext_attrs("I", &[], None).unwrap();
    assert_eq!(set, ExposureSet::window());
    assert!(set.contains("Window"));
    assert!(!set.contains("DedicatedWorker"));
}

#[test]
fn test_default_falls_back_to_owner_exposure() {
    let owner = ExposureSet::from_names(["DedicatedWorker"]);
    let set = ExposureSet::from_ext_attrs("m", &[], Some(&owner)).unwrap();
    assert_eq!(set, owner);
}

#[test]
fn test_worker_expands_to_every_worker_global() {
    let set = ExposureSet::from_ext_attrs("I", &[exposed("Worker")], None).unwrap();
    for name in WORKER_EXPOSURE_NAMES {
        assert!(set.contains(name), "{name}");
    }
    assert!(!set.contains("Worker"));
    assert!(!set.contains("Window"));
}

#[test]
fn test_wildcard() {
    let set = ExposureSet::from_ext_attrs("I", &[exposed("*")], None).unwrap();
    assert_eq!(set, ExposureSet::Everywhere);
    assert!(set.exposed_in(Some(GlobalScope::ShadowRealm)).unwrap());
    assert!(set.exposed_in(None).unwrap());
    assert_eq!(set.to_string(), "*");
}

#[test]
fn test_multiple_exposed_is_an_error() {
    let err = ExposureSet::from_ext_attrs("I", &[exposed("Window"), exposed("Worker")], None).unwrap_err();
    assert!(matches!(err, HarnessError::MultipleExposed(name) if name == "I"));
}

#[test]
fn test_exposed_in_scope() {
    let set = ExposureSet::from_names(["Window", "ServiceWorker"]);
    assert!(set.exposed_in(Some(GlobalScope::Window)).unwrap());
    assert!(set.exposed_in(Some(GlobalScope::ServiceWorker)).unwrap());
    assert!(!set.exposed_in(Some(GlobalScope::SharedWorker)).unwrap());
    assert!(!set.exposed_in(Some(GlobalScope::ShadowRealm)).unwrap());
    assert!(matches!(set.exposed_in(None), Err(HarnessError::UnexpectedGlobalObject)));
}

#[test]
fn test_first_missing_from() {
    let window = ExposureSet::window();
    let both = ExposureSet::from_names(["Window", "DedicatedWorker"]);
    assert_eq!(window.first_missing_from(&both), None);
    assert_eq!(both.first_missing_from(&window).as_deref(), Some("DedicatedWorker"));
    assert_eq!(ExposureSet::Everywhere.first_missing_from(&window).as_deref(), Some("*"));
    assert_eq!(both.first_missing_from(&ExposureSet::Everywhere), None);
}

#[test]
fn test_display_lists_globals_in_order() {
    let set = ExposureSet::from_names(["Window", "Worker"]);
    assert_eq!(set.to_string(), "(Window,DedicatedWorker,ServiceWorker,SharedWorker)");
}
