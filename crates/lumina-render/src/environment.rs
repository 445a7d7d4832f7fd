//! Loading environment images into cubemaps and ambient spherical harmonics.

use std::f32::consts::PI;
use std::path::Path;

use glam::Vec3;
use lumina_core::spherical_harmonics::CUBE_FACE_COUNT;
use lumina_core::{CubeMap, LuminaError, SphericalHarmonicL2};

use crate::error::RenderResult;

/// Builds a cubemap from six decoded faces in the order +X, -X, +Y, -Y, +Z, -Z.
/// Every face must be square and the same size.
pub fn cubemap_from_faces(faces: &[image::DynamicImage; CUBE_FACE_COUNT]) -> RenderResult<CubeMap> {
    let size = faces[0].width();
    for face in faces {
        if face.width() != face.height() {
            return Err(LuminaError::invalid(
                "cubemap.face",
                format!("faces must be square, got {}x{}", face.width(), face.height()),
            )
            .into());
        }
        if face.width() != size {
            return Err(LuminaError::SizeMismatch {
                expected: size as usize,
                actual: face.width() as usize,
            }
            .into());
        }
    }

    let texels = faces.each_ref().map(|face| {
        face.to_rgb32f()
            .pixels()
            .map(|p| Vec3::new(p[0], p[1], p[2]))
            .collect::<Vec<_>>()
    });
    let cubemap = CubeMap {
        size: size as usize,
        faces: texels,
    };
    cubemap.validate()?;
    Ok(cubemap)
}

/// Loads six face files in the order +X, -X, +Y, -Y, +Z, -Z.
pub fn load_cubemap<P: AsRef<Path>>(paths: &[P; CUBE_FACE_COUNT]) -> RenderResult<CubeMap> {
    let mut faces = Vec::with_capacity(CUBE_FACE_COUNT);
    for path in paths {
        faces.push(image::open(path.as_ref())?);
    }
    let faces: [image::DynamicImage; CUBE_FACE_COUNT] = faces
        .try_into()
        .map_err(|_| LuminaError::invalid("cubemap.faces", "expected six faces"))?;
    let cubemap = cubemap_from_faces(&faces)?;
    log::info!("loaded {0}x{0} cubemap", cubemap.size);
    Ok(cubemap)
}

/// Resamples an equirectangular image into a cubemap with `size` texels per edge.
pub fn cubemap_from_equirect(image: &image::Rgb32FImage, size: usize) -> RenderResult<CubeMap> {
    if size == 0 || image.width() == 0 || image.height() == 0 {
        return Err(LuminaError::invalid("cubemap.size", "sizes must be greater than zero").into());
    }
    let (w, h) = (image.width(), image.height());
    Ok(CubeMap::from_fn(size, |dir| {
        let (u, v) = equirect_uv(dir);
        let x = ((u * w as f32) as u32).min(w - 1);
        let y = ((v * h as f32) as u32).min(h - 1);
        let p = image.get_pixel(x, y);
        Vec3::new(p[0], p[1], p[2])
    }))
}

/// Lookup matching the shaders' `equirect_uv`: +Y is the top row and
/// +X the horizontal centre.
#[must_use]
pub fn equirect_uv(dir: Vec3) -> (f32, f32) {
    let d = dir.normalize_or_zero();
    let u = d.z.atan2(d.x) / (2.0 * PI) + 0.5;
    let v = d.y.clamp(-1.0, 1.0).acos() / PI;
    (u, v)
}

/// Ambient SH for six face files.
pub fn load_ambient_sh<P: AsRef<Path>>(paths: &[P; CUBE_FACE_COUNT]) -> RenderResult<SphericalHarmonicL2> {
    Ok(SphericalHarmonicL2::from_cubemap(&load_cubemap(paths)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(size: u32, value: f32) -> image::DynamicImage {
        image::DynamicImage::ImageRgb32F(image::Rgb32FImage::from_pixel(
            size,
            size,
            image::Rgb([value, value, value]),
        ))
    }

    #[test]
    fn test_uniform_faces_project_to_constant() {
        let faces = std::array::from_fn(|_| solid(8, 0.5));
        let cubemap = cubemap_from_faces(&faces).unwrap();
        let sh = SphericalHarmonicL2::from_cubemap(&cubemap).unwrap();
        for dir in [Vec3::X, Vec3::NEG_Y, Vec3::new(1.0, 1.0, -1.0).normalize()] {
            let radiance = sh.evaluate(dir);
            assert!((radiance - Vec3::splat(0.5)).abs().max_element() < 1e-3, "{radiance:?}");
        }
    }

    #[test]
    fn test_mismatched_faces_rejected() {
        let mut faces = std::array::from_fn(|_| solid(8, 1.0));
        faces[3] = solid(4, 1.0);
        assert!(cubemap_from_faces(&faces).is_err());

        faces[3] = image::DynamicImage::ImageRgb32F(image::Rgb32FImage::new(8, 4));
        assert!(cubemap_from_faces(&faces).is_err());
    }

    #[test]
    fn test_equirect_uv_poles_and_centre() {
        let (_, v) = equirect_uv(Vec3::Y);
        assert!(v.abs() < 1e-6);
        let (_, v) = equirect_uv(Vec3::NEG_Y);
        assert!((v - 1.0).abs() < 1e-6);
        let (u, v) = equirect_uv(Vec3::NEG_X);
        assert!((u - 0.0).abs() < 1e-6 || (u - 1.0).abs() < 1e-6);
        assert!((v - 0.5).abs() < 1e-6);
        let (u, _) = equirect_uv(Vec3::X);
        assert!((u - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_equirect_sky_lights_from_above() {
        // Bright upper half, dark lower half
        let image = image::Rgb32FImage::from_fn(16, 8, |_, y| {
            if y < 4 {
                image::Rgb([1.0, 1.0, 1.0])
            } else {
                image::Rgb([0.0, 0.0, 0.0])
            }
        });
        let cubemap = cubemap_from_equirect(&image, 8).unwrap();
        let sh = SphericalHarmonicL2::from_cubemap(&cubemap).unwrap();
        assert!(sh.irradiance(Vec3::Y).x > sh.irradiance(Vec3::NEG_Y).x);
    }
}
