/// Which patients a listing should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatientFilter {
    All,
    Ward(String),
    Critical,
}
