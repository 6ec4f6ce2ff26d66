//! 编码折线（encoded polyline）解码
//!
//! Directions API 的 overview_polyline 使用差分 + zig-zag + base64
//! 变体的字符编码，精度 1e-5。这里只需要解码；编码仅测试构造
//! 夹具时使用。

use anyhow::{bail, Result};
use crate::fomo::types::LatLng;

/// 解码一个有符号分量，返回（值，消耗的字节数）
fn decode_component(bytes: &[u8]) -> Result<(i64, usize)> {
    let mut result: i64 = 0;
    let mut shift = 0u32;
    for (index, &byte) in bytes.iter().enumerate() {
        if !(63..=126).contains(&byte) {
            bail!("折线中出现非法字符: {byte:#x}");
        }
        // 连续字节过多会把 shift 推出 i64 的位宽
        if shift > 62 {
            bail!("折线分量超出取值范围");
        }
        let chunk = i64::from(byte - 63);
        result |= (chunk & 0x1f) << shift;
        if chunk < 0x20 {
            // zig-zag 还原符号
            let value = if result & 1 != 0 { !(result >> 1) } else { result >> 1 };
            return Ok((value, index + 1));
        }
        shift += 5;
    }
    bail!("折线在分量中途截断")
}

/// 解码整条折线为坐标序列
pub fn decode(polyline: &str) -> Result<Vec<LatLng>> {
    let bytes = polyline.as_bytes();
    let mut points = Vec::new();
    let mut offset = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while offset < bytes.len() {
        let (d_lat, used) = decode_component(&bytes[offset..])?;
        offset += used;
        let (d_lng, used) = decode_component(&bytes[offset..])?;
        offset += used;
        lat += d_lat;
        lng += d_lng;
        points.push(LatLng::new(lat as f64 / 1e5, lng as f64 / 1e5));
    }
    Ok(points)
}

/// 编码单个分量（测试夹具用）
#[cfg(test)]
fn encode_component(value: i64, out: &mut String) {
    let mut v = if value < 0 { !(value << 1) } else { value << 1 };
    while v >= 0x20 {
        out.push(((0x20 | (v & 0x1f)) + 63) as u8 as char);
        v >>= 5;
    }
    out.push((v + 63) as u8 as char);
}

/// 编码坐标序列为折线（测试夹具用）
#[cfg(test)]
pub(crate) fn encode(points: &[LatLng]) -> String {
    let mut out = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;
    for point in points {
        let lat = (point.latitude * 1e5).round() as i64;
        let lng = (point.longitude * 1e5).round() as i64;
        encode_component(lat - prev_lat, &mut out);
        encode_component(lng - prev_lng, &mut out);
        prev_lat = lat;
        prev_lng = lng;
    }
    out
}
