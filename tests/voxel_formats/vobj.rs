//! Round-trip coverage for the VOBJ codec, driven entirely through the public `voxelio` API.

use voxelio::prelude::*;

#[test]
fn writer_roundtrips_a_flat_list() {
	let sink = ByteArrayStream::from_bytes(Vec::new());
	let mut writer = VobjWriter::new(sink);
	assert_eq!(writer.init(), ResultCode::OkInitialized);
	writer.write(&[
		Voxel64 {
			pos: [100, -200, 300],
			argb: Color32::new(255, 10, 20, 30).to_argb32(),
		},
		Voxel64 {
			pos: [0, 0, 0],
			argb: Color32::new(128, 1, 2, 3).to_argb32(),
		},
	]);
	assert_eq!(writer.finalize(), ResultCode::WriteEnd);

	let mut reader = VobjReader::new(ByteArrayStream::from_bytes(writer.into_sink().into_bytes()));
	assert_eq!(reader.init().code, ResultCode::OkInitialized);

	let mut seen = Vec::new();
	loop {
		let mut buf = [Voxel64::default(); 4];
		let result = reader.read(&mut buf);
		seen.extend_from_slice(&buf[..result.voxels_read as usize]);
		if result.code == ResultCode::ReadEnd {
			break;
		}
	}
	assert_eq!(seen.len(), 2);
	assert!(seen.iter().any(|v| v.pos == [100, -200, 300] && v.argb == Color32::new(255, 10, 20, 30).to_argb32()));
	assert!(seen.iter().any(|v| v.pos == [0, 0, 0] && v.argb == Color32::new(128, 1, 2, 3).to_argb32()));
}

#[test]
fn rejects_bad_magic() {
	let mut reader = VobjReader::new(ByteArrayStream::from_bytes(b"this is not a vobj stream".to_vec()));
	assert_eq!(reader.init().code, ResultCode::ReadErrorUnexpectedMagic);
}

#[test]
fn writer_uses_a_palette_when_one_is_populated() {
	let sink = ByteArrayStream::from_bytes(Vec::new());
	let mut writer = VobjWriter::new(sink);
	writer.palette_mut().push(Color32::new(255, 10, 20, 30));
	writer.palette_mut().push(Color32::new(255, 40, 50, 60));
	writer.init();
	writer.write(&[Voxel64 {
		pos: [1, 1, 1],
		argb: Color32::new(255, 40, 50, 60).to_argb32(),
	}]);
	writer.finalize();

	let mut reader = VobjReader::new(ByteArrayStream::from_bytes(writer.into_sink().into_bytes()));
	reader.init();
	let mut buf = [Voxel64::default(); 2];
	let result = reader.read(&mut buf);
	assert_eq!(result.voxels_read, 1);
	assert_eq!(buf[0].argb, Color32::new(255, 40, 50, 60).to_argb32());
}
