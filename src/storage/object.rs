use crate::storage::metadata::ObjectMetadata;

#[derive(Debug)]
pub struct StoredObject {
    pub data: Vec<u8>,
    /// Absent for files placed in the store by hand
    pub metadata: Option<ObjectMetadata>,
}
