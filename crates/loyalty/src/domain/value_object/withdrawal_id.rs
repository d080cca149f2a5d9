use kernel::id::Id;

#[derive(Clone, Copy)]
pub struct WithdrawalMarker;
pub type WithdrawalId = Id<WithdrawalMarker>;
