use std::collections::BTreeSet;

/// Metadata for one row of a matrix workspace: the spectrum number assigned
/// by the instrument and the set of detector IDs that contributed to it.
///
/// The histogram data itself lives in the workspace storage (in memory or
/// paged to disk); this metadata is small and always stays resident.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpectrumInfo {
    spectrum_no: i64,
    detector_ids: BTreeSet<i64>,
}

impl SpectrumInfo {
    pub fn new(spectrum_no: i64) -> Self {
        Self {
            spectrum_no,
            detector_ids: BTreeSet::new(),
        }
    }

    pub fn spectrum_no(&self) -> i64 {
        self.spectrum_no
    }

    pub fn set_spectrum_no(&mut self, spectrum_no: i64) {
        self.spectrum_no = spectrum_no;
    }

    pub fn detector_ids(&self) -> &BTreeSet<i64> {
        &self.detector_ids
    }

    pub fn add_detector_id(&mut self, id: i64) {
        self.detector_ids.insert(id);
    }

    pub fn add_detector_ids<I: IntoIterator<Item = i64>>(&mut self, ids: I) {
        self.detector_ids.extend(ids);
    }

    pub fn has_detector_id(&self, id: i64) -> bool {
        self.detector_ids.contains(&id)
    }

    pub fn clear_detector_ids(&mut self) {
        self.detector_ids.clear();
    }
}
