//! End-to-end execution of registered transforms.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use kiln_fingerprint::{FileSet, PropertySpec, WorkFingerprinter};
use kiln_transform::{
    slots_for, BoxError, ExecutionStage, InvalidOutputReason, PropertySchema, Setter, SlotKind,
    Transform, TransformError, TransformRegistration, TypeSchema,
};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Unzip: primary input marked on the setter, workspace marked on the field.
// ---------------------------------------------------------------------------

#[derive(Clone, Serialize)]
struct UnzipParams {
    entry_name: String,
}

struct Unzip {
    entry_name: String,
    input: Option<PathBuf>,
    output_dir: Option<PathBuf>,
}

impl Unzip {
    fn set_input(&mut self, path: PathBuf) -> Result<(), BoxError> {
        self.input = Some(path);
        Ok(())
    }

    fn set_output_dir(&mut self, path: PathBuf) -> Result<(), BoxError> {
        self.output_dir = Some(path);
        Ok(())
    }
}

impl Transform for Unzip {
    type Parameters = UnzipParams;

    fn schema() -> TypeSchema<Self> {
        TypeSchema::new()
            .property(
                PropertySchema::new("input")
                    .setter(Setter::new(Unzip::set_input).marked(SlotKind::PrimaryInput)),
            )
            .property(
                PropertySchema::new("output_dir")
                    .field(&[SlotKind::Workspace])
                    .setter(Setter::new(Unzip::set_output_dir)),
            )
    }

    fn instantiate(parameters: UnzipParams) -> Result<Self, BoxError> {
        Ok(Unzip {
            entry_name: parameters.entry_name,
            input: None,
            output_dir: None,
        })
    }

    fn transform(&mut self) -> Result<Vec<PathBuf>, BoxError> {
        let input = self.input.as_ref().ok_or("input not injected")?;
        let dir = self.output_dir.as_ref().ok_or("workspace not injected")?;
        let contents = fs::read(input)?;
        let out = dir.join(&self.entry_name);
        fs::write(&out, contents)?;
        Ok(vec![out])
    }
}

#[test]
fn slots_are_injected_before_the_action_runs() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("lib.jar");
    let out_dir = dir.path().join("out");
    fs::write(&input, "payload").unwrap();
    fs::create_dir_all(&out_dir).unwrap();

    let registration = TransformRegistration::<Unzip>::new(UnzipParams {
        entry_name: "lib.txt".to_string(),
    })
    .unwrap();
    assert_eq!(registration.display_name(), "Unzip");
    assert_eq!(registration.slots().primary_input.unwrap().property, "input");
    assert_eq!(registration.slots().workspace.unwrap().property, "output_dir");

    let outputs = registration.execute(&input, &out_dir).unwrap();
    assert_eq!(outputs, vec![out_dir.join("lib.txt")]);
    assert_eq!(fs::read_to_string(&outputs[0]).unwrap(), "payload");
}

#[test]
fn missing_input_fails_in_execution_stage() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("out");
    fs::create_dir_all(&out_dir).unwrap();

    let registration = TransformRegistration::<Unzip>::new(UnzipParams {
        entry_name: "x".to_string(),
    })
    .unwrap()
    .named("unzip-x");
    let err = registration
        .execute(&dir.path().join("absent.jar"), &out_dir)
        .unwrap_err();
    assert_eq!(err.stage(), Some(ExecutionStage::Execute));
    assert!(err.to_string().contains("unzip-x"));
}

// ---------------------------------------------------------------------------
// Stamp: no slots at all; its target comes from the configure action.
// ---------------------------------------------------------------------------

#[derive(Clone, Serialize, Default)]
struct StampParams {
    target: Option<PathBuf>,
}

struct Stamp {
    target: Option<PathBuf>,
}

impl Transform for Stamp {
    type Parameters = StampParams;

    fn schema() -> TypeSchema<Self> {
        TypeSchema::new()
    }

    fn instantiate(parameters: StampParams) -> Result<Self, BoxError> {
        Ok(Stamp {
            target: parameters.target,
        })
    }

    fn transform(&mut self) -> Result<Vec<PathBuf>, BoxError> {
        let target = self.target.clone().ok_or("no target configured")?;
        fs::write(&target, "stamped")?;
        Ok(vec![target])
    }
}

#[test]
fn transform_without_slots_uses_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("out");
    fs::create_dir_all(&out_dir).unwrap();

    let target = out_dir.join("stamp.txt");
    let configured = target.clone();
    let registration =
        TransformRegistration::<Stamp>::with_configuration(StampParams::default(), move |p| {
            p.target = Some(configured.clone());
        })
        .unwrap();
    assert!(registration.slots().is_empty());

    let outputs = registration
        .execute(&dir.path().join("ignored.jar"), &out_dir)
        .unwrap();
    assert_eq!(outputs, vec![target]);
}

#[test]
fn output_outside_workspace_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("out");
    fs::create_dir_all(&out_dir).unwrap();

    let stray = dir.path().join("stray.txt");
    let registration = TransformRegistration::<Stamp>::new(StampParams {
        target: Some(stray.clone()),
    })
    .unwrap();

    let err = registration
        .execute(&dir.path().join("in.jar"), &out_dir)
        .unwrap_err();
    match err {
        TransformError::InvalidOutput { path, reason, .. } => {
            assert_eq!(path, stray);
            assert_eq!(reason, InvalidOutputReason::OutsideAllowedRoots);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unconfigured_action_failure_reports_cause() {
    let dir = tempfile::tempdir().unwrap();
    let registration = TransformRegistration::<Stamp>::new(StampParams::default()).unwrap();
    let err = registration
        .execute(&dir.path().join("in.jar"), dir.path())
        .unwrap_err();
    assert_eq!(err.stage(), Some(ExecutionStage::Execute));
    let cause = std::error::Error::source(&err).unwrap();
    assert_eq!(cause.to_string(), "no target configured");
}

#[test]
fn secondary_inputs_hash_follows_configuration() {
    let plain = TransformRegistration::<Stamp>::new(StampParams::default()).unwrap();
    let same = TransformRegistration::<Stamp>::new(StampParams::default()).unwrap();
    let configured =
        TransformRegistration::<Stamp>::with_configuration(StampParams::default(), |p| {
            p.target = Some(PathBuf::from("/out/stamp.txt"));
        })
        .unwrap();

    assert_eq!(plain.secondary_inputs_hash(), same.secondary_inputs_hash());
    assert_ne!(plain.secondary_inputs_hash(), configured.secondary_inputs_hash());
}

#[test]
fn same_parameters_on_different_types_hash_differently() {
    #[derive(Clone, Serialize)]
    struct Empty;

    struct A;
    struct B;

    impl Transform for A {
        type Parameters = Empty;
        fn schema() -> TypeSchema<Self> {
            TypeSchema::new()
        }
        fn instantiate(_: Empty) -> Result<Self, BoxError> {
            Ok(A)
        }
        fn transform(&mut self) -> Result<Vec<PathBuf>, BoxError> {
            Ok(Vec::new())
        }
    }

    impl Transform for B {
        type Parameters = Empty;
        fn schema() -> TypeSchema<Self> {
            TypeSchema::new()
        }
        fn instantiate(_: Empty) -> Result<Self, BoxError> {
            Ok(B)
        }
        fn transform(&mut self) -> Result<Vec<PathBuf>, BoxError> {
            Ok(Vec::new())
        }
    }

    let a = TransformRegistration::<A>::new(Empty).unwrap();
    let b = TransformRegistration::<B>::new(Empty).unwrap();
    assert_ne!(a.secondary_inputs_hash(), b.secondary_inputs_hash());
}

// ---------------------------------------------------------------------------
// Observe: records the primary input and counts action runs.
// ---------------------------------------------------------------------------

thread_local! {
    // Tests run on separate threads and the action runs on the caller's.
    static OBSERVE_RUNS: Cell<usize> = const { Cell::new(0) };
}

#[derive(Clone, Serialize)]
struct NoParams;

struct Observe {
    input: Option<PathBuf>,
}

impl Observe {
    fn set_input(&mut self, path: PathBuf) -> Result<(), BoxError> {
        self.input = Some(path);
        Ok(())
    }
}

impl Transform for Observe {
    type Parameters = NoParams;

    fn schema() -> TypeSchema<Self> {
        TypeSchema::new().property(
            PropertySchema::new("input")
                .field(&[SlotKind::PrimaryInput])
                .setter(Setter::new(Observe::set_input)),
        )
    }

    fn instantiate(_: NoParams) -> Result<Self, BoxError> {
        Ok(Observe { input: None })
    }

    fn transform(&mut self) -> Result<Vec<PathBuf>, BoxError> {
        OBSERVE_RUNS.with(|runs| runs.set(runs.get() + 1));
        match &self.input {
            Some(path) if path == Path::new("/src/lib.jar") => Ok(Vec::new()),
            other => Err(format!("unexpected input {other:?}").into()),
        }
    }
}

#[test]
fn primary_input_is_observed_by_the_action() {
    let dir = tempfile::tempdir().unwrap();
    let registration = TransformRegistration::<Observe>::new(NoParams).unwrap();
    let outputs = registration
        .execute(Path::new("/src/lib.jar"), dir.path())
        .unwrap();
    assert!(outputs.is_empty());
}

#[test]
fn fingerprinting_inputs_does_not_run_the_action() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("lib.jar");
    fs::write(&jar, "classes").unwrap();

    let registration = TransformRegistration::<Observe>::new(NoParams).unwrap();
    let walker = |t: &Observe| {
        let files: FileSet = t.input.iter().cloned().collect();
        vec![PropertySpec::input_files("input", files)]
    };

    let runs_before = OBSERVE_RUNS.with(Cell::get);
    let key = registration
        .fingerprint_inputs_only(&jar, &walker, &WorkFingerprinter::default(), &"transform Observe")
        .unwrap();
    assert_eq!(OBSERVE_RUNS.with(Cell::get), runs_before);

    let fingerprint = key.get("input").unwrap();
    assert_eq!(fingerprint.len(), 1);

    fs::write(&jar, "changed classes").unwrap();
    let changed = registration
        .fingerprint_inputs_only(&jar, &walker, &WorkFingerprinter::default(), &"transform Observe")
        .unwrap();
    assert_ne!(changed.get("input"), key.get("input"));
}

#[test]
fn fingerprinting_leaves_workspace_unset() {
    let registration = TransformRegistration::<Unzip>::new(UnzipParams {
        entry_name: "x".to_string(),
    })
    .unwrap();
    let workspace_seen = Arc::new(AtomicUsize::new(0));
    let seen = workspace_seen.clone();
    let walker = move |t: &Unzip| -> Vec<PropertySpec> {
        if t.output_dir.is_some() {
            seen.fetch_add(1, Ordering::SeqCst);
        }
        Vec::new()
    };

    let key = registration
        .fingerprint_inputs_only(
            Path::new("/src/lib.jar"),
            &walker,
            &WorkFingerprinter::default(),
            &"transform Unzip",
        )
        .unwrap();
    assert!(key.is_empty());
    assert_eq!(workspace_seen.load(Ordering::SeqCst), 0);
}

#[test]
fn walker_read_failure_surfaces_as_fingerprint_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("plain.txt");
    fs::write(&file, "x").unwrap();

    let registration = TransformRegistration::<Observe>::new(NoParams).unwrap();
    let walker = |_: &Observe| {
        let files: FileSet = std::iter::once(file.join("nested")).collect();
        vec![PropertySpec::input_files("input", files)]
    };
    let err = registration
        .fingerprint_inputs_only(&file, &walker, &WorkFingerprinter::default(), &"t")
        .unwrap_err();
    assert!(matches!(err, TransformError::Fingerprint { .. }));
}

#[test]
fn slot_discovery_is_shared_per_type() {
    let first = slots_for::<Observe>();
    let handles: Vec<_> = (0..4)
        .map(|_| std::thread::spawn(slots_for::<Observe>))
        .collect();
    for handle in handles {
        assert!(Arc::ptr_eq(&first, &handle.join().unwrap()));
    }
}

// ---------------------------------------------------------------------------
// Failures before the action runs.
// ---------------------------------------------------------------------------

#[derive(Clone, Serialize)]
struct Version(u32);

struct Pinned;

impl Transform for Pinned {
    type Parameters = Version;

    fn schema() -> TypeSchema<Self> {
        TypeSchema::new()
    }

    fn instantiate(version: Version) -> Result<Self, BoxError> {
        if version.0 == 0 {
            return Err("version must be positive".into());
        }
        Ok(Pinned)
    }

    fn transform(&mut self) -> Result<Vec<PathBuf>, BoxError> {
        Ok(Vec::new())
    }
}

#[test]
fn instantiation_failure_is_wrapped_with_cause() {
    let dir = tempfile::tempdir().unwrap();
    let registration = TransformRegistration::<Pinned>::new(Version(0)).unwrap();

    let err = registration
        .execute(Path::new("/src/lib.jar"), dir.path())
        .unwrap_err();
    assert_eq!(err.stage(), Some(ExecutionStage::Instantiate));
    let cause = std::error::Error::source(&err).unwrap();
    assert_eq!(cause.to_string(), "version must be positive");

    let err = registration
        .fingerprint_inputs_only(
            Path::new("/src/lib.jar"),
            &|_: &Pinned| -> Vec<PropertySpec> { Vec::new() },
            &WorkFingerprinter::default(),
            &"transform Pinned",
        )
        .unwrap_err();
    assert_eq!(err.stage(), Some(ExecutionStage::Instantiate));
}

#[derive(Clone, Serialize)]
struct Strict;

struct JarOnly;

impl JarOnly {
    fn set_input(&mut self, path: PathBuf) -> Result<(), BoxError> {
        if path.extension().is_some_and(|ext| ext == "jar") {
            Ok(())
        } else {
            Err(format!("{} is not a jar", path.display()).into())
        }
    }
}

impl Transform for JarOnly {
    type Parameters = Strict;

    fn schema() -> TypeSchema<Self> {
        TypeSchema::new().property(
            PropertySchema::new("input")
                .setter(Setter::new(JarOnly::set_input).marked(SlotKind::PrimaryInput)),
        )
    }

    fn instantiate(_: Strict) -> Result<Self, BoxError> {
        Ok(JarOnly)
    }

    fn transform(&mut self) -> Result<Vec<PathBuf>, BoxError> {
        Err("action must not run after a failed injection".into())
    }
}

#[test]
fn rejecting_setter_fails_in_injection_stage() {
    let dir = tempfile::tempdir().unwrap();
    let registration = TransformRegistration::<JarOnly>::new(Strict).unwrap();

    let err = registration
        .execute(Path::new("/src/lib.zip"), dir.path())
        .unwrap_err();
    assert_eq!(err.stage(), Some(ExecutionStage::Inject));
    let cause = std::error::Error::source(&err).unwrap();
    assert_eq!(cause.to_string(), "/src/lib.zip is not a jar");
    assert!(err.to_string().contains("during injection"));
}
