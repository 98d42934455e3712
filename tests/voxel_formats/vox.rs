//! Round-trip coverage for the MagicaVoxel (VOX) codec, driven entirely through the public
//! `voxelio` API.

use voxelio::prelude::*;

#[test]
fn writer_roundtrips_a_tile_through_its_scene_graph() {
	let sink = ByteArrayStream::from_bytes(Vec::new());
	let mut writer = VoxWriter::new(sink);
	writer.palette_mut().push(Color32::new(255, 10, 20, 30));
	assert_eq!(writer.init(), ResultCode::OkInitialized);
	writer.write(&[Voxel32 {
		pos: [0, 0, 0],
		argb: Color32::new(255, 10, 20, 30).to_argb32(),
	}]);
	assert_eq!(writer.finalize(), ResultCode::WriteEnd);

	let mut reader = VoxReader::new(ByteArrayStream::from_bytes(writer.into_sink().into_bytes()), false);
	assert_eq!(reader.init().code, ResultCode::OkInitialized);

	let mut buf = [Voxel32::default(); 4];
	let result = reader.read(&mut buf);
	assert!(result.voxels_read >= 1);
	assert_eq!(buf[0].argb, Color32::new(255, 10, 20, 30).to_argb32());
}

#[test]
fn missing_palette_is_rejected_at_init() {
	let sink = ByteArrayStream::from_bytes(Vec::new());
	let mut writer = VoxWriter::new(sink);
	assert_eq!(writer.init(), ResultCode::UserErrorMissingPalette);
}

#[test]
fn rejects_a_stream_missing_the_vox_magic() {
	let mut reader = VoxReader::new(ByteArrayStream::from_bytes(b"not a vox file".to_vec()), false);
	let result = reader.init();
	assert_eq!(result.code, ResultCode::ReadErrorUnexpectedMagic);
}
