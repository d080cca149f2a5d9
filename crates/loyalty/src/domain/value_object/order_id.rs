use kernel::id::Id;

#[derive(Clone, Copy)]
pub struct OrderMarker;
pub type OrderId = Id<OrderMarker>;
