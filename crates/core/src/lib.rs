mod batch;
mod catalog;
mod classify;
mod graph;
mod images;
mod layout;
mod material;
mod settings;
mod shader_nodes;
mod synth;

pub use batch::{
    asset_folders, collect_texture_set, find_mesh_file, list_files, AssetLibrary, BatchError,
    BatchImporter, BatchReport, FolderReport, ImportHost, MATERIALS_CATALOG, MESH_EXTENSIONS,
    MODELS_CATALOG,
};
pub use catalog::{AssetCatalog, AssetCatalogFile, CatalogError, CATALOG_HEADER};
pub use classify::{classify, is_supported_image, TextureRole, IMAGE_EXTENSIONS};
pub use graph::{
    GraphError, Link, LinkId, Node, NodeId, NodeParams, ParamValue, Pin, PinId, PinKind,
    ShaderGraph, SocketType,
};
pub use images::{ColorSpace, ImageId, ImageLibrary, ImageResource};
pub use layout::{
    layout, PrimaryNodes, SecondaryNode, SecondaryNodes, TertiaryNode, TertiaryNodes, TierKey,
    TierMap, PLACEMENT_ORDER, X_OFFSET, Y_OFFSET,
};
pub use material::{Material, MaterialLibrary};
pub use settings::{
    AssetType, FeatureToggles, ImportSettings, MapNames, SettingsError, DEFAULT_CATALOG_FILE_NAME,
};
pub use shader_nodes::{
    setting, socket, NodeDefinition, ShaderNodeKind, SocketDefinition, MATERIAL_OUTPUT_NAME,
    PRINCIPLED_BSDF_NAME,
};
pub use synth::{synthesize, SynthError, SynthesisReport, TextureSet};
