//! OpenGL scene viewer: loads OBJ and glTF models into a scene, renders it
//! with a textured shader and flies a first-person camera through it.

pub mod engine;
