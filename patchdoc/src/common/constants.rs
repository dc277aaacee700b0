// document constants
pub const DOC_ID: &str = "_id";

// update operators
pub const SET_OPERATOR: &str = "$set";
pub const UNSET_OPERATOR: &str = "$unset";
pub const INC_OPERATOR: &str = "$inc";

// projection
pub const PROJECTION_INCLUDE: i32 = 1;

// logging
pub const PLUGIN_NAME: &str = "patchdoc";
