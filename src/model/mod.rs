pub mod alt;
pub mod factory;
pub mod null;
pub mod state;
pub mod transitions;

pub use alt::{AltModel, CoreNode, FlankStates, Node, SpecialNode, StateId};
pub use factory::{FrameStateFactory, StandardStateFactory, StateFactory};
pub use null::NullModel;
pub use state::{Emission, State, StateKind};
pub use transitions::{SpecialTransitions, Transitions};
