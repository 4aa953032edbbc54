use glam::{Mat3, Quat, Vec3};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CAMERA_HEIGHT: f32 = 1.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at: Vec3,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, DEFAULT_CAMERA_HEIGHT, 0.0),
            look_at: Vec3::new(0.0, DEFAULT_CAMERA_HEIGHT, -1.0),
        }
    }
}

impl CameraPose {
    pub fn forward(&self) -> Vec3 {
        let forward = (self.look_at - self.position).normalize_or_zero();
        if forward == Vec3::ZERO {
            Vec3::NEG_Z
        } else {
            forward
        }
    }

    /// Right-handed orientation with -Z forward and +Y up.
    pub fn orientation(&self) -> Quat {
        let forward = self.forward();
        let mut right = forward.cross(Vec3::Y);
        if right.length_squared() < 1e-8 {
            right = Vec3::X;
        }
        let right = right.normalize();
        let up = right.cross(forward);
        Quat::from_mat3(&Mat3::from_cols(right, up, -forward))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraWriter {
    FreeLook,
    Traversal,
    SceneTransition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CameraWriteError {
    #[error("camera is owned by {owner:?}; {writer:?} may not write it")]
    NotOwner {
        owner: CameraWriter,
        writer: CameraWriter,
    },
    #[error("camera transform is sealed for the rest of this tick")]
    Sealed,
    #[error("free-look is disabled")]
    FreeLookDisabled,
}

/// The single camera transform plus its ownership arbitration.
///
/// While an owner is set, every other writer is rejected at entry. After
/// the end-of-tick resync the rig is sealed and rejects all writes until
/// the next tick unseals it.
#[derive(Debug, Clone)]
pub struct CameraRig {
    pose: CameraPose,
    owner: Option<CameraWriter>,
    free_look_enabled: bool,
    sealed: bool,
    write_count: u64,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            pose: CameraPose::default(),
            owner: None,
            free_look_enabled: true,
            sealed: false,
            write_count: 0,
        }
    }
}

impl CameraRig {
    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    pub fn position(&self) -> Vec3 {
        self.pose.position
    }

    pub fn owner(&self) -> Option<CameraWriter> {
        self.owner
    }

    pub fn free_look_enabled(&self) -> bool {
        self.free_look_enabled
    }

    pub fn set_free_look_enabled(&mut self, enabled: bool) {
        self.free_look_enabled = enabled;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn write_count(&self) -> u64 {
        self.write_count
    }

    pub fn claim(&mut self, writer: CameraWriter) -> Result<(), CameraWriteError> {
        match self.owner {
            Some(owner) if owner != writer => Err(CameraWriteError::NotOwner { owner, writer }),
            _ => {
                self.owner = Some(writer);
                debug!(?writer, "camera_claimed");
                Ok(())
            }
        }
    }

    pub fn release(&mut self, writer: CameraWriter) {
        if self.owner == Some(writer) {
            self.owner = None;
            debug!(?writer, "camera_released");
        }
    }

    pub fn write(&mut self, writer: CameraWriter, pose: CameraPose) -> Result<(), CameraWriteError> {
        if self.sealed {
            return Err(CameraWriteError::Sealed);
        }
        match self.owner {
            Some(owner) if owner != writer => {
                return Err(CameraWriteError::NotOwner { owner, writer });
            }
            None if writer == CameraWriter::FreeLook && !self.free_look_enabled => {
                return Err(CameraWriteError::FreeLookDisabled);
            }
            _ => {}
        }
        self.pose = pose;
        self.write_count = self.write_count.saturating_add(1);
        Ok(())
    }

    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }

    pub(crate) fn unseal(&mut self) {
        self.sealed = false;
    }
}
