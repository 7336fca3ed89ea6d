//! Frame-aware extraction with stale-sweep detection
//!
//! A [`ContourEngine`] owns one range tracker per field and a generation
//! counter. Every sweep captures the generation when it starts; advancing the
//! frame while it runs marks the sweep stale and its partial output is
//! dropped instead of being handed back.

use crate::{
    iso_surface::{nodal_values, sweep_iso_surface, IsoSurfaceConfig},
    levels::LevelSpacing,
    range::{scan_range, RangeConfig, RangeTracker},
    section::{
        stack_planes, sweep_plane_section, PlaneSection, PlaneSectionConfig, SliceStackConfig,
    },
};
use isoslice_core::{
    Error, FieldSelector, MeshProvider, Plane, Result, TriangleBuffer, ValueRange, Vector3f,
    VisibilityOracle,
};
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex, MutexGuard,
};
use tracing::{debug, info};

/// Generation captured at the start of a sweep
#[derive(Debug, Clone, Copy)]
pub struct SweepToken<'a> {
    counter: &'a AtomicU64,
    issued: u64,
}

impl<'a> SweepToken<'a> {
    /// Generation the sweep started on
    pub fn generation(&self) -> u64 {
        self.issued
    }

    /// Whether no newer frame was started since the token was issued
    pub fn is_current(&self) -> bool {
        self.counter.load(Ordering::Acquire) == self.issued
    }
}

/// Outcome of a sweep run through the engine
#[derive(Debug, Clone, PartialEq)]
pub enum Sweep<T> {
    Complete(T),
    /// The frame changed while the sweep ran; nothing was published
    Stale,
}

impl<T> Sweep<T> {
    /// Whether the sweep was discarded
    pub fn is_stale(&self) -> bool {
        matches!(self, Sweep::Stale)
    }

    /// The result of a complete sweep
    pub fn into_option(self) -> Option<T> {
        match self {
            Sweep::Complete(value) => Some(value),
            Sweep::Stale => None,
        }
    }

    fn from_option(value: Option<T>) -> Self {
        value.map_or(Sweep::Stale, Sweep::Complete)
    }
}

/// Range trackers keyed by field, sharing one set of policies
#[derive(Debug, Default)]
struct RangeBook {
    config: RangeConfig,
    trackers: HashMap<FieldSelector, RangeTracker>,
}

/// Runs sweeps against successive frames of a mesh
#[derive(Debug, Default)]
pub struct ContourEngine {
    generation: AtomicU64,
    ranges: Mutex<RangeBook>,
}

impl ContourEngine {
    /// Engine whose fields are all tracked with the given policies
    pub fn new(config: RangeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            generation: AtomicU64::new(0),
            ranges: Mutex::new(RangeBook {
                config,
                trackers: HashMap::new(),
            }),
        })
    }

    /// Generation of the current frame
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Start a new frame; sweeps still running on the old one become stale
    pub fn advance_frame(&self) -> u64 {
        let next = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(generation = next, "frame advanced");
        next
    }

    /// Forget the running extrema of every field
    pub fn reset_range(&self) -> Result<()> {
        for tracker in self.book()?.trackers.values_mut() {
            tracker.reset();
        }
        Ok(())
    }

    /// Range resolved for the last frame of a field, if it was ever swept
    pub fn range(&self, field: &FieldSelector) -> Result<Option<ValueRange>> {
        let book = self.book()?;
        Ok(book.trackers.get(field).map(RangeTracker::current))
    }

    /// Replace the range policies of every field, keeping the running extrema
    pub fn set_range_config(&self, config: RangeConfig) -> Result<()> {
        config.validate()?;
        let mut book = self.book()?;
        book.config = config;
        for tracker in book.trackers.values_mut() {
            tracker.config = config;
        }
        Ok(())
    }

    /// Capture the current generation
    pub fn begin(&self) -> SweepToken<'_> {
        SweepToken {
            counter: &self.generation,
            issued: self.generation(),
        }
    }

    fn book(&self) -> Result<MutexGuard<'_, RangeBook>> {
        self.ranges
            .lock()
            .map_err(|_| Error::Algorithm("Range tracker lock poisoned".to_string()))
    }

    fn update_range(&self, field: &FieldSelector, values: &[f32]) -> Result<ValueRange> {
        let frame = scan_range(values);
        let mut book = self.book()?;
        let config = book.config;
        let tracker = book
            .trackers
            .entry(field.clone())
            .or_insert_with(|| RangeTracker::new(config));
        Ok(tracker.update_with(frame))
    }

    /// Iso-surfaces at the given reference values, colored against the tracked range
    pub fn iso_surface<M>(
        &self,
        mesh: &M,
        field: &FieldSelector,
        reference_values: &[f32],
        config: &IsoSurfaceConfig,
    ) -> Result<Sweep<TriangleBuffer>>
    where
        M: MeshProvider + VisibilityOracle + ?Sized,
    {
        config.validate()?;
        let token = self.begin();
        let values = nodal_values(mesh, field)?;
        let range = self.update_range(field, &values)?;
        let buffer =
            sweep_iso_surface(mesh, &values, reference_values, range, config, Some(&token))?;
        Ok(Sweep::from_option(buffer.filter(|_| token.is_current())))
    }

    /// Evenly spaced iso-surfaces across the tracked range
    pub fn iso_levels<M>(
        &self,
        mesh: &M,
        field: &FieldSelector,
        spacing: &LevelSpacing,
        config: &IsoSurfaceConfig,
    ) -> Result<Sweep<TriangleBuffer>>
    where
        M: MeshProvider + VisibilityOracle + ?Sized,
    {
        config.validate()?;
        spacing.validate()?;
        let token = self.begin();
        let values = nodal_values(mesh, field)?;
        let range = self.update_range(field, &values)?;
        let levels = spacing.levels(range);
        let buffer = sweep_iso_surface(mesh, &values, &levels, range, config, Some(&token))?;
        Ok(Sweep::from_option(buffer.filter(|_| token.is_current())))
    }

    /// Plane section with texture coordinates against the tracked range
    pub fn plane_section<M>(
        &self,
        mesh: &M,
        field: &FieldSelector,
        plane: &Plane,
        config: &PlaneSectionConfig,
    ) -> Result<Sweep<PlaneSection>>
    where
        M: MeshProvider + VisibilityOracle + ?Sized,
    {
        config.validate()?;
        let token = self.begin();
        let values = mesh.field(field)?;
        let range = self.update_range(field, values)?;
        let section = sweep_plane_section(
            mesh,
            values,
            field.location,
            plane,
            range,
            config,
            Some(&token),
        )?;
        Ok(Sweep::from_option(section.filter(|_| token.is_current())))
    }

    /// Slice stack sharing one tracked range; stale as a whole if any slice is
    pub fn slice_stack<M>(
        &self,
        mesh: &M,
        field: &FieldSelector,
        normal: &Vector3f,
        config: &SliceStackConfig,
    ) -> Result<Sweep<Vec<PlaneSection>>>
    where
        M: MeshProvider + VisibilityOracle + ?Sized,
    {
        config.validate()?;
        let token = self.begin();
        let values = mesh.field(field)?;
        let range = self.update_range(field, values)?;
        let Some(planes) = stack_planes(mesh, normal, config)? else {
            return Ok(Sweep::Complete(Vec::new()));
        };

        let mut sections = Vec::with_capacity(planes.len());
        for plane in &planes {
            let section = sweep_plane_section(
                mesh,
                values,
                field.location,
                plane,
                range,
                &config.section,
                Some(&token),
            )?;
            match section {
                Some(section) => sections.push(section),
                None => return Ok(Sweep::Stale),
            }
        }
        if !token.is_current() {
            return Ok(Sweep::Stale);
        }
        info!(slices = sections.len(), generation = token.generation(), "slice stack complete");
        Ok(Sweep::Complete(sections))
    }
}
