use super::*;

#[test]
fn test_update_node_image_plain_tag() {
    let input = "FROM node:18\nWORKDIR /app\n";

    assert_eq!(update_node_image(input, "22"), "FROM node:22\nWORKDIR /app\n");
}

#[test]
fn test_update_node_image_keeps_suffix_and_stage() {
    let input = "FROM node:18.19.0-alpine AS build\nRUN npm ci\nFROM node:18-slim\n";

    let output = update_node_image(input, "22");

    assert_eq!(output, "FROM node:22-alpine AS build\nRUN npm ci\nFROM node:22-slim\n");
}

#[test]
fn test_update_node_image_with_platform_and_registry() {
    let input = "FROM --platform=linux/amd64 docker.io/library/node:20-bookworm\n";

    let output = update_node_image(input, "22");

    assert_eq!(
        output,
        "FROM --platform=linux/amd64 docker.io/library/node:22-bookworm\n"
    );
}

#[test]
fn test_update_node_image_never_downgrades() {
    let input = "FROM node:23\n";

    assert_eq!(update_node_image(input, "22"), input);
}

#[test]
fn test_update_node_image_ignores_other_images() {
    let input = "FROM nginx:1.25\nFROM mynode:18\nFROM node:lts\n";

    assert_eq!(update_node_image(input, "22"), input);
}

#[test]
fn test_update_node_image_is_idempotent() {
    let input = "from node:16-alpine\n";

    let once = update_node_image(input, "22");

    assert_eq!(once, "from node:22-alpine\n");
    assert_eq!(update_node_image(&once, "22"), once);
}
