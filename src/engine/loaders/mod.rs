pub mod gltf_importer;
pub mod importer;
pub mod obj_importer;
pub mod obj_parser;

pub use gltf_importer::GltfImporter;
pub use importer::{
    importer_for_path,
    ImportedMaterial,
    ImportedMesh,
    ImportedNode,
    ImportedScene,
    ModelImporter,
};
pub use obj_importer::ObjImporter;
pub use obj_parser::{ load_obj_file, parse_obj, ParsedObj };
