//! Playground orchestrator
//!
//! The joint table is shared with the sampling and playback timer tasks;
//! mapping writes it, the sampler snapshots it into the recorder.

use joint_mapper::{BodyMapper, JointStateTable, MappingReport};
use pose_capture::{Admission, CaptureError, FrameThrottle, HolisticFrame};
use robot_model::{ApplyReport, MeshFileMap, ModelApplier, RobotModel};
use session_recorder::{
    run_player, run_sampler, CaptureSurface, PlaybackHandle, Player, RecordedFrame,
    RecordedSession, Recorder, Shared,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::PlaygroundConfig;
use crate::guard::{Guarded, RenderGuard};
use crate::{status, PlaygroundError};

/// Selected URDF document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrdfFile {
    pub name: String,
    pub text: String,
}

/// A spawned sampler or player loop
struct TimerTask {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<usize>,
}

impl TimerTask {
    fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Cancel and wait; returns the frames the loop handled
    async fn finish(self) -> usize {
        // The loop may already have exited and dropped its receiver
        let _ = self.cancel.send(true);
        match self.handle.await {
            Ok(frames) => frames,
            Err(e) => {
                warn!("Timer task failed: {}", e);
                0
            }
        }
    }
}

/// Upload, load, track, record and replay state for one robot session
pub struct Playground {
    config: PlaygroundConfig,
    urdf: Option<UrdfFile>,
    meshes: MeshFileMap,
    model: Option<RobotModel>,
    guard: RenderGuard,
    mapper: BodyMapper,
    applier: ModelApplier,
    throttle: FrameThrottle,
    joints: Shared<JointStateTable>,
    recorder: Arc<Mutex<Recorder>>,
    sampler: Option<TimerTask>,
    player: Option<Player>,
    replay: Option<TimerTask>,
    playback: Option<PlaybackHandle>,
    tracking: bool,
    status: String,
    recording_status: String,
}

impl Playground {
    pub fn new(config: PlaygroundConfig) -> Result<Self, PlaygroundError> {
        config.validate()?;
        let mapper = BodyMapper::new(config.mapper.clone())?;
        let throttle = config.capture.throttle();

        Ok(Self {
            config,
            urdf: None,
            meshes: MeshFileMap::new(),
            model: None,
            guard: RenderGuard::new(),
            mapper,
            applier: ModelApplier::default(),
            throttle,
            joints: Arc::new(RwLock::new(JointStateTable::new())),
            recorder: Arc::new(Mutex::new(Recorder::new())),
            sampler: None,
            player: None,
            replay: None,
            playback: None,
            tracking: false,
            status: status::INITIAL.to_string(),
            recording_status: String::new(),
        })
    }

    fn fail(&mut self, err: PlaygroundError) -> PlaygroundError {
        self.status = err.to_string();
        err
    }

    fn fail_recording(&mut self, err: PlaygroundError) -> PlaygroundError {
        self.recording_status = err.to_string();
        err
    }

    // ---- Uploads ----

    /// Select the URDF document; names without a `.urdf` extension clear the selection
    pub fn select_urdf(&mut self, name: &str, text: impl Into<String>) -> Result<(), PlaygroundError> {
        if !name.to_lowercase().ends_with(".urdf") {
            self.urdf = None;
            return Err(self.fail(PlaygroundError::InvalidUrdfFile));
        }
        self.urdf = Some(UrdfFile {
            name: name.to_string(),
            text: text.into(),
        });
        self.status = status::urdf_selected(name);
        Ok(())
    }

    /// Replace the mesh set with `uploads`, keeping only mesh formats
    pub fn select_mesh_files<I, S>(&mut self, uploads: I) -> Result<usize, PlaygroundError>
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: Into<String>,
    {
        let (meshes, skipped) = MeshFileMap::from_uploads(uploads);
        if skipped > 0 {
            debug!("Skipped {} non-mesh uploads", skipped);
        }
        if meshes.is_empty() {
            self.meshes.clear();
            return Err(self.fail(PlaygroundError::NoValidMeshes));
        }

        let count = meshes.len();
        self.meshes = meshes;
        self.status = status::meshes_loaded(count);
        Ok(count)
    }

    // ---- Model ----

    /// Load the selected URDF with the selected meshes.
    ///
    /// On success every model joint starts at 0 in the joint table.
    pub async fn load_robot(&mut self) -> Result<(), PlaygroundError> {
        if self.urdf.is_none() {
            return Err(self.fail(PlaygroundError::NoUrdfSelected));
        }
        if self.meshes.is_empty() {
            return Err(self.fail(PlaygroundError::NoMeshFiles));
        }

        self.status = status::LOADING.to_string();
        self.model = None;
        self.joints.write().await.clear();
        self.guard.reset();

        let urdf = self.urdf.as_ref().ok_or(PlaygroundError::NoUrdfSelected)?;
        let meshes = &self.meshes;
        let model_config = &self.config.model;
        match self.guard.run(|| RobotModel::load(&urdf.text, meshes, model_config)) {
            Guarded::Ok(model) => {
                info!("Robot '{}' loaded from {}", model.name(), urdf.name);
                *self.joints.write().await = JointStateTable::zeroed(model.joint_names());
                self.model = Some(model);
                self.mapper.reset();
                self.status = status::LOADED.to_string();
                Ok(())
            }
            Guarded::Faulted(message) => Err(self.fail(PlaygroundError::Load(message))),
        }
    }

    /// Renderer callback: the scene failed after loading
    pub fn report_render_fault(&mut self, message: &str) {
        self.guard.record(message);
        self.status = status::RENDER_FAULT.to_string();
    }

    /// Leave the faulted state; the robot must be loaded again
    pub async fn reset_fault(&mut self) {
        self.guard.reset();
        self.model = None;
        self.joints.write().await.clear();
        self.status = status::RETRY.to_string();
    }

    /// Push the joint table into the model
    pub async fn sync_model(&mut self) -> Option<ApplyReport> {
        if self.guard.is_faulted() {
            return None;
        }
        let model = self.model.as_mut()?;
        let joints = self.joints.read().await;
        Some(self.applier.apply(model, &joints))
    }

    // ---- Tracking ----

    /// Camera frame captured at `now`: may it go to the detector?
    pub fn admit_frame(&mut self, now: Instant) -> Admission {
        self.throttle.offer(now)
    }

    /// Detector results for the admitted frame.
    ///
    /// Without a loaded robot the frame only updates the tracking flag.
    pub async fn on_detector_results(&mut self, frame: &HolisticFrame) -> MappingReport {
        self.throttle.complete();
        self.tracking = frame.has_pose();

        if self.model.is_none() {
            return MappingReport {
                tracked: self.tracking,
                ..Default::default()
            };
        }

        let report = {
            let mut joints = self.joints.write().await;
            self.mapper.update(frame, &mut joints)
        };
        if report.has_updates() {
            self.sync_model().await;
        }
        report
    }

    /// Admit and map in one step; `None` when the throttle drops the frame
    pub async fn on_landmarks(&mut self, frame: &HolisticFrame, now: Instant) -> Option<MappingReport> {
        match self.admit_frame(now) {
            Admission::Admitted => Some(self.on_detector_results(frame).await),
            dropped => {
                debug!("Frame at {}ms dropped: {:?}", frame.timestamp_ms, dropped);
                None
            }
        }
    }

    /// The landmark source failed; tracking stops until frames arrive again
    pub fn report_capture_error(&mut self, err: CaptureError) -> PlaygroundError {
        warn!("Capture failed: {}", err);
        self.tracking = false;
        self.throttle.reset();
        self.fail(err.into())
    }

    /// Fraction of detector results that contained a body
    pub fn tracking_ratio(&self) -> f64 {
        self.mapper.tracking_ratio()
    }

    // ---- Recording ----

    /// Start recording and spawn the sampler that snapshots the joint table
    /// every sample period. Needs a loaded robot.
    pub async fn start_recording(&mut self, surface: &dyn CaptureSurface) -> Result<(), PlaygroundError> {
        if self.model.is_none() {
            return Err(self.fail_recording(PlaygroundError::NoRobotToRecord));
        }
        self.stop_playback().await;
        self.playback = None;

        let started = self.recorder.lock().await.start(surface);
        match started {
            Ok(mime_type) => {
                let (cancel, cancel_rx) = watch::channel(false);
                let handle = tokio::spawn(run_sampler(
                    self.recorder.clone(),
                    self.joints.clone(),
                    self.config.recorder.sample_period(),
                    cancel_rx,
                ));
                self.sampler = Some(TimerTask { cancel, handle });
                debug!("Sampling joints into a {} recording", mime_type);
                self.recording_status = status::RECORDING_STARTED.to_string();
                Ok(())
            }
            Err(e) => Err(self.fail_recording(e.into())),
        }
    }

    pub async fn push_media_chunk(&mut self, chunk: Vec<u8>) -> bool {
        self.recorder.lock().await.push_chunk(chunk)
    }

    /// Stop the sampler, then finish the recording
    pub async fn stop_recording(&mut self) -> Result<(), PlaygroundError> {
        if let Some(sampler) = self.sampler.take() {
            let sampled = sampler.finish().await;
            debug!("Sampler took {} frames", sampled);
        }

        let stopped = self
            .recorder
            .lock()
            .await
            .stop()
            .map(|media| (media.data.len(), media.mime_type.clone()));
        match stopped {
            Ok((bytes, mime_type)) => {
                debug!("Assembled {} bytes of {}", bytes, mime_type);
                self.recording_status = status::RECORDING_STOPPED.to_string();
                Ok(())
            }
            Err(e) => Err(self.fail_recording(e.into())),
        }
    }

    /// Play the recorded media and, with a loaded robot, queue its joint frames
    pub async fn play_recording(&mut self) -> Result<PlaybackHandle, PlaygroundError> {
        let (media, frames) = {
            let recorder = self.recorder.lock().await;
            (
                PlaybackHandle::from_media(recorder.media()),
                recorder.frames().to_vec(),
            )
        };
        let handle = match media {
            Ok(handle) => handle,
            Err(e) => return Err(self.fail_recording(e.into())),
        };

        if self.model.is_none() {
            warn!("Robot not loaded, skipping joint playback");
        } else if !frames.is_empty() {
            self.stop_playback().await;
            self.player = Some(Player::new(frames));
        }

        self.playback = Some(handle.clone());
        self.recording_status = status::PLAYING.to_string();
        Ok(handle)
    }

    /// Queue the recorded joint frames only (no media needed)
    pub async fn replay_motion(&mut self) -> Result<usize, PlaygroundError> {
        if self.model.is_none() {
            return Err(self.fail_recording(PlaygroundError::ModelNotLoaded));
        }
        self.stop_playback().await;
        let frames = self.recorder.lock().await.frames().to_vec();
        let count = frames.len();
        self.player = Some(Player::new(frames));
        Ok(count)
    }

    /// Manual playback step; `None` once every queued frame was written
    pub async fn playback_tick(&mut self) -> Option<i64> {
        let player = self.player.as_mut()?;
        let next = player.next_frame(&mut *self.joints.write().await);
        let Some(timestamp) = next else {
            self.player = None;
            return None;
        };
        self.sync_model().await;
        Some(timestamp)
    }

    /// Hand the queued frames to a player task writing one frame per
    /// sample period. `false` when nothing is queued.
    pub fn spawn_playback(&mut self) -> bool {
        let Some(player) = self.player.take() else {
            return false;
        };
        let (cancel, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(run_player(
            player,
            self.joints.clone(),
            self.config.recorder.sample_period(),
            cancel_rx,
        ));
        self.replay = Some(TimerTask { cancel, handle });
        true
    }

    /// Cancel queued or running joint playback; returns frames the task wrote
    pub async fn stop_playback(&mut self) -> usize {
        self.player = None;
        match self.replay.take() {
            Some(task) => task.finish().await,
            None => 0,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_some() || self.replay.as_ref().is_some_and(TimerTask::is_running)
    }

    /// Media playback finished
    pub fn playback_ended(&mut self) {
        self.playback = None;
    }

    pub async fn export_session(&mut self) -> Result<Vec<u8>, PlaygroundError> {
        let encoded = self.recorder.lock().await.session().to_bytes();
        match encoded {
            Ok(bytes) => {
                self.recording_status = status::SESSION_EXPORTED.to_string();
                Ok(bytes)
            }
            Err(e) => Err(self.fail_recording(e.into())),
        }
    }

    pub async fn import_session(&mut self, bytes: &[u8]) -> Result<usize, PlaygroundError> {
        let session = match RecordedSession::from_bytes(bytes) {
            Ok(session) => session,
            Err(e) => return Err(self.fail_recording(e.into())),
        };
        let frames = session.frames.len();
        let restored = self.recorder.lock().await.restore(session);
        if let Err(e) = restored {
            return Err(self.fail_recording(e.into()));
        }

        info!("Imported session with {} frames", frames);
        self.recording_status = status::SESSION_IMPORTED.to_string();
        Ok(frames)
    }

    // ---- Reset ----

    /// Drop uploads, model, joint state and recording artifacts
    pub async fn clear_files(&mut self) {
        if let Some(sampler) = self.sampler.take() {
            sampler.finish().await;
        }
        self.stop_playback().await;

        self.urdf = None;
        self.meshes.clear();
        self.model = None;
        self.guard.reset();
        self.joints.write().await.clear();
        self.mapper.reset();
        self.throttle.reset();
        self.tracking = false;

        self.recorder.lock().await.clear();
        self.playback = None;
        self.recording_status.clear();

        self.status = status::CLEARED.to_string();
        info!("Playground cleared");
    }

    // ---- Accessors ----

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn recording_status(&self) -> &str {
        &self.recording_status
    }

    /// Handle on the live joint table
    pub fn joint_table(&self) -> Shared<JointStateTable> {
        self.joints.clone()
    }

    /// Snapshot of the joint table
    pub async fn joints(&self) -> JointStateTable {
        self.joints.read().await.clone()
    }

    pub fn model(&self) -> Option<&RobotModel> {
        self.model.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub async fn is_recording(&self) -> bool {
        self.recorder.lock().await.is_recording()
    }

    pub async fn recorded_frames(&self) -> Vec<RecordedFrame> {
        self.recorder.lock().await.frames().to_vec()
    }

    pub fn playback(&self) -> Option<&PlaybackHandle> {
        self.playback.as_ref()
    }

    pub fn fault(&self) -> Option<&str> {
        self.guard.fault()
    }

    pub fn urdf(&self) -> Option<&UrdfFile> {
        self.urdf.as_ref()
    }

    pub fn meshes(&self) -> &MeshFileMap {
        &self.meshes
    }

    pub fn config(&self) -> &PlaygroundConfig {
        &self.config
    }

    pub fn throttle(&self) -> &FrameThrottle {
        &self.throttle
    }
}
