// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use tari_crypto::hash_domain;

// Hash domain for every field-element hash computed by the engine: tree nodes, leaves, epoch keys and nullifiers.
// Changing the version changes every root, so it must match whatever the verifying contract uses.
hash_domain!(UnirepFieldHashDomain, "com.unirep.base_layer.field_hash", 1);
