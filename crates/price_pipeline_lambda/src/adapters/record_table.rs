use price_pipeline_core::contract::PersistedRecord;

pub trait PredictionTable {
    /// Writes are keyed by `record_id`; repeating a write replaces the item.
    fn put_prediction(&self, record: &PersistedRecord) -> Result<(), String>;
}
