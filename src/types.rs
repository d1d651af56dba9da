/// Unique record identifier, usually the panorama id of the image.
/// Example: `CAoSLEFGMVFpcE1qd3h3`
pub type RecordKey = String;
/// Human-readable place label attached to a record.
/// Examples: `Shanghai`, `Hokkaido`
pub type TargetName = String;
/// Dense classification label id, the lexicographic rank of the target name.
pub type LabelId = usize;
/// Identifier for the source that produced a record collection.
/// Examples: `in_memory`, `records.json`
pub type SourceId = String;
/// Coordinate component in signed decimal degrees.
pub type Degrees = f64;
/// Great-circle distance in kilometers.
pub type Kilometers = f64;
