use slotmap::new_key_type;

new_key_type! {
    /// Identifies a resource registered with the manager.
    pub struct ResourceId;

    /// Identifies a system registered with the manager.
    pub struct SystemId;
}
