//! Identities, property bags and the raw scenario dataset as delivered by the
//! data source.  Nothing in here knows about visibility or rendering.

pub mod attrs;
pub mod dataset;
pub mod ids;
pub mod properties;

pub use attrs::{attr_text, attrs_from_json, merge_attrs, Attrs};
pub use dataset::{
    DataEdge, DataNode, Dataset, RawNode, RawRelationship, CONDITIONAL_RELATION,
    HIERARCHY_RELATION, ORIGIN_LABEL, PARENT_LABEL,
};
pub use ids::{EdgeId, NodeId};
pub use properties::{PropertyBag, WellKnownField, DISPLAY_NAME_PRIORITY};
