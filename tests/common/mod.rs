#![allow(dead_code)]

use std::path::{ Path, PathBuf };

use scene_viewer::engine::rendering::{ HeadlessGpu, ShaderProgram, ShaderSource, VertexLayout };

pub const LAYOUT: VertexLayout = VertexLayout { position: 0, normal: 1, tex_coord: 2 };

/// Fresh directory under the system temp dir, unique per test name.
pub fn fixture_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("scene_viewer_it_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 120, 40, 255]));
    image.save(path).unwrap();
}

/// Single textured triangle with an MTL file referencing `texture`.
pub fn write_textured_obj(dir: &Path, name: &str, texture: &str) -> PathBuf {
    let mtl = format!("{}.mtl", name);
    std::fs::write(dir.join(&mtl), format!("newmtl crate\nKd 1 1 1\nmap_Kd {}\n", texture)).unwrap();

    let obj = dir.join(format!("{}.obj", name));
    std::fs::write(
        &obj,
        format!(
            "mtllib {}\no {}\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nusemtl crate\nf 1/1 2/2 3/3\n",
            mtl,
            name
        )
    ).unwrap();
    obj
}

pub fn shader(gpu: &mut HeadlessGpu) -> ShaderProgram<HeadlessGpu> {
    let source = ShaderSource {
        vertex: "void main() {}".into(),
        fragment: "void main() {}".into(),
    };
    ShaderProgram::from_source(gpu, &source, "integration").unwrap()
}
